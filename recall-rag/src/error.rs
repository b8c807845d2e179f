//! Error types for the `recall-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Invalid chunking or search parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The embedding backend failed or was given invalid input.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The storage backend failed: a constraint violation, an I/O failure on
    /// the database file, or a dimensionality mismatch between stored
    /// embeddings and the active embedding model.
    #[error("Storage error ({backend}): {message}")]
    Storage {
        /// The storage backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Lookup of a document id that does not exist.
    #[error("Document {document_id} not found")]
    NotFound {
        /// The id that was requested.
        document_id: i64,
    },

    /// A failure partway through ingesting a document. Any rows written for
    /// the attempt have been rolled back before this surfaces.
    #[error("Ingestion of '{document}' failed: {message}")]
    Ingestion {
        /// The name of the document that failed to ingest.
        document: String,
        /// A description of the underlying failure.
        message: String,
    },
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RecallError>;
