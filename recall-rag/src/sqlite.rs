//! SQLite-backed document store.
//!
//! Provides [`SqliteStore`], which persists documents and chunks in a single
//! embedded database file. Embeddings are stored as raw little-endian `f32`
//! blobs with no header; the dimensionality is tracked out-of-band in a
//! `meta` table, written at creation and checked on every reopen, insert,
//! and read. A database built with a different model is rejected rather than
//! silently scored.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::document::{Chunk, Document, DocumentMeta, StoredChunk};
use crate::error::{RecallError, Result};
use crate::store::DocumentStore;

const BACKEND: &str = "sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    content     TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    chunk_count INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS chunks (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_id    INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    text      TEXT NOT NULL,
    embedding BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_doc ON chunks(doc_id);
";

/// A [`DocumentStore`] backed by an embedded SQLite database.
///
/// Writers take the connection mutex for the duration of their transaction,
/// so a multi-chunk insert or a cascading delete is atomic with respect to
/// readers: a concurrent scan never observes a document with some but not
/// all of its chunks.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

impl SqliteStore {
    /// Open (or create) a database at `path` for embeddings of the given
    /// dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Storage`] if the file cannot be opened or was
    /// created for a different dimensionality.
    pub fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        let conn = Connection::open(&path).map_err(Self::map_err)?;
        let store = Self::init(conn, dimensions)?;
        info!(path = %path.as_ref().display(), dimensions, "opened document store");
        Ok(store)
    }

    /// Open an in-memory database, for tests and throwaway indexes.
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Self::map_err)?;
        Self::init(conn, dimensions)
    }

    /// Open an existing database using the dimensionality it was created
    /// with. Useful for listing and deleting without loading a model.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Storage`] if the file is not a recall index.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(&path).map_err(Self::map_err)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(Self::map_err)?;
        let dimensions: i64 = conn
            .query_row("SELECT value FROM meta WHERE key = 'embedding_dim'", [], |row| row.get(0))
            .optional()
            .map_err(Self::map_err)?
            .ok_or_else(|| {
                Self::storage(format!(
                    "{} is not a recall index (no recorded dimensionality)",
                    path.as_ref().display()
                ))
            })?;
        Ok(Self { conn: Mutex::new(conn), dimensions: dimensions as usize })
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Self::storage("embedding dimensionality must be greater than zero"));
        }
        conn.pragma_update(None, "foreign_keys", "ON").map_err(Self::map_err)?;
        conn.execute_batch(SCHEMA).map_err(Self::map_err)?;

        let recorded: Option<i64> = conn
            .query_row("SELECT value FROM meta WHERE key = 'embedding_dim'", [], |row| row.get(0))
            .optional()
            .map_err(Self::map_err)?;
        match recorded {
            Some(d) if d == dimensions as i64 => {}
            Some(d) => {
                return Err(Self::storage(format!(
                    "database was created for {d}-dimensional embeddings, \
                     the active model produces {dimensions}; reindex or pick the matching model"
                )));
            }
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('embedding_dim', ?1)",
                    params![dimensions as i64],
                )
                .map_err(Self::map_err)?;
            }
        }

        Ok(Self { conn: Mutex::new(conn), dimensions })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Self::storage("connection lock poisoned"))
    }

    fn storage(message: impl Into<String>) -> RecallError {
        RecallError::Storage { backend: BACKEND.to_string(), message: message.into() }
    }

    fn map_err(e: rusqlite::Error) -> RecallError {
        Self::storage(e.to_string())
    }
}

/// Encode an embedding as concatenated little-endian `f32` bytes.
pub(crate) fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a blob written by [`encode_embedding`], checking that it holds
/// exactly `dimensions` floats.
///
/// Byte size alone cannot distinguish a wrong-model blob from a corrupted
/// one, so both fail as [`RecallError::Storage`].
pub(crate) fn decode_embedding(bytes: &[u8], dimensions: usize) -> Result<Vec<f32>> {
    if bytes.len() != dimensions * 4 {
        return Err(SqliteStore::storage(format!(
            "embedding blob holds {} bytes, expected {} ({dimensions} floats)",
            bytes.len(),
            dimensions * 4,
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SqliteStore::storage(format!("invalid timestamp '{raw}': {e}")))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, name: &str, text: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (name, content, uploaded_at, chunk_count) \
             VALUES (?1, ?2, ?3, 0)",
            params![name, text, Utc::now().to_rfc3339()],
        )
        .map_err(Self::map_err)?;
        let id = conn.last_insert_rowid();
        debug!(document_id = id, name, "inserted document");
        Ok(id)
    }

    async fn insert_chunks(&self, document_id: i64, chunks: &[(String, Vec<f32>)]) -> Result<()> {
        for (index, (_, embedding)) in chunks.iter().enumerate() {
            if embedding.len() != self.dimensions {
                return Err(Self::storage(format!(
                    "chunk {index} has a {}-dimensional embedding, store expects {}",
                    embedding.len(),
                    self.dimensions,
                )));
            }
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(Self::map_err)?;
        {
            let owner: Option<i64> = tx
                .query_row(
                    "SELECT id FROM documents WHERE id = ?1",
                    params![document_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(Self::map_err)?;
            if owner.is_none() {
                return Err(RecallError::NotFound { document_id });
            }

            let mut stmt = tx
                .prepare("INSERT INTO chunks (doc_id, text, embedding) VALUES (?1, ?2, ?3)")
                .map_err(Self::map_err)?;
            for (text, embedding) in chunks {
                stmt.execute(params![document_id, text, encode_embedding(embedding)])
                    .map_err(Self::map_err)?;
            }

            tx.execute(
                "UPDATE documents SET chunk_count = ?1 WHERE id = ?2",
                params![chunks.len() as i64, document_id],
            )
            .map_err(Self::map_err)?;
        }
        tx.commit().map_err(Self::map_err)?;
        debug!(document_id, count = chunks.len(), "inserted chunks");
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentMeta>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, chunk_count, length(CAST(content AS BLOB)), uploaded_at \
                 FROM documents ORDER BY uploaded_at DESC, id DESC",
            )
            .map_err(Self::map_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(Self::map_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Self::map_err)?;

        rows.into_iter()
            .map(|(id, name, chunk_count, size_bytes, uploaded_at)| {
                Ok(DocumentMeta {
                    id,
                    name,
                    chunk_count,
                    size_bytes,
                    uploaded_at: parse_timestamp(&uploaded_at)?,
                })
            })
            .collect()
    }

    async fn get_document(&self, document_id: i64) -> Result<Option<Document>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, name, content, uploaded_at, chunk_count \
                 FROM documents WHERE id = ?1",
                params![document_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(Self::map_err)?;

        row.map(|(id, name, text, uploaded_at, chunk_count)| {
            Ok(Document { id, name, text, uploaded_at: parse_timestamp(&uploaded_at)?, chunk_count })
        })
        .transpose()
    }

    async fn all_chunks(&self) -> Result<Vec<StoredChunk>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.doc_id, c.text, c.embedding, d.name \
                 FROM chunks c JOIN documents d ON d.id = c.doc_id \
                 ORDER BY c.id",
            )
            .map_err(Self::map_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(Self::map_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Self::map_err)?;

        rows.into_iter()
            .map(|(id, document_id, text, blob, document_name)| {
                let embedding = decode_embedding(&blob, self.dimensions)?;
                Ok(StoredChunk {
                    document_name,
                    chunk: Chunk { id, document_id, text, embedding },
                })
            })
            .collect()
    }

    async fn delete_document(&self, document_id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![document_id])
            .map_err(Self::map_err)?;
        if affected > 0 {
            debug!(document_id, "deleted document and its chunks");
        }
        Ok(affected > 0)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_codec_round_trips() {
        let vector = vec![0.0f32, 1.0, -1.0, 0.5, f32::MIN_POSITIVE];
        let bytes = encode_embedding(&vector);
        assert_eq!(bytes.len(), vector.len() * 4);
        assert_eq!(decode_embedding(&bytes, vector.len()).unwrap(), vector);
    }

    #[test]
    fn blob_layout_is_little_endian() {
        // 1.0f32 is 0x3f800000; little-endian on disk.
        assert_eq!(encode_embedding(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(decode_embedding(&[0x00, 0x00, 0x80, 0x3f], 1).unwrap(), vec![1.0]);
    }

    #[test]
    fn blob_with_wrong_length_is_rejected() {
        let bytes = encode_embedding(&[1.0, 2.0, 3.0]);
        let err = decode_embedding(&bytes, 4).unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }));
        // A truncated blob fails the same way.
        assert!(decode_embedding(&bytes[..10], 3).is_err());
    }

    #[tokio::test]
    async fn insert_list_and_get_document() {
        let store = SqliteStore::open_in_memory(3).unwrap();
        let id = store.insert_document("notes.txt", "alpha beta gamma").await.unwrap();

        let listed = store.list_documents().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].name, "notes.txt");
        assert_eq!(listed[0].chunk_count, 0);
        assert_eq!(listed[0].size_bytes, "alpha beta gamma".len() as i64);

        let doc = store.get_document(id).await.unwrap().unwrap();
        assert_eq!(doc.text, "alpha beta gamma");
        assert!(store.get_document(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_chunks_sets_count_and_preserves_order() {
        let store = SqliteStore::open_in_memory(2).unwrap();
        let id = store.insert_document("a.txt", "text").await.unwrap();
        store
            .insert_chunks(
                id,
                &[
                    ("first".to_string(), vec![1.0, 0.0]),
                    ("second".to_string(), vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let listed = store.list_documents().await.unwrap();
        assert_eq!(listed[0].chunk_count, 2);

        let chunks = store.all_chunks().await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk.text, "first");
        assert_eq!(chunks[1].chunk.text, "second");
        assert_eq!(chunks[0].document_name, "a.txt");
        assert_eq!(chunks[0].chunk.embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn insert_chunks_for_missing_document_is_not_found() {
        let store = SqliteStore::open_in_memory(2).unwrap();
        let err = store
            .insert_chunks(42, &[("text".to_string(), vec![0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::NotFound { document_id: 42 }));
    }

    #[tokio::test]
    async fn insert_chunks_rejects_wrong_dimensionality() {
        let store = SqliteStore::open_in_memory(3).unwrap();
        let id = store.insert_document("a.txt", "text").await.unwrap();
        let err = store
            .insert_chunks(id, &[("text".to_string(), vec![1.0, 2.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }));
        // Nothing committed.
        assert!(store.all_chunks().await.unwrap().is_empty());
        assert_eq!(store.list_documents().await.unwrap()[0].chunk_count, 0);
    }

    #[tokio::test]
    async fn delete_cascades_to_chunks() {
        let store = SqliteStore::open_in_memory(1).unwrap();
        let keep = store.insert_document("keep.txt", "kept").await.unwrap();
        let drop = store.insert_document("drop.txt", "dropped").await.unwrap();
        store.insert_chunks(keep, &[("kept".to_string(), vec![1.0])]).await.unwrap();
        store.insert_chunks(drop, &[("dropped".to_string(), vec![2.0])]).await.unwrap();

        assert!(store.delete_document(drop).await.unwrap());
        assert!(!store.delete_document(drop).await.unwrap());

        let listed = store.list_documents().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep);

        let chunks = store.all_chunks().await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk.document_id, keep);
    }

    #[tokio::test]
    async fn reopening_with_a_different_dimensionality_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        let store = SqliteStore::open(&path, 384).unwrap();
        let id = store.insert_document("a.txt", "text").await.unwrap();
        store.insert_chunks(id, &[("text".to_string(), vec![0.0; 384])]).await.unwrap();
        drop(store);

        let err = SqliteStore::open(&path, 768).unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }));

        // The matching dimensionality still opens.
        let reopened = SqliteStore::open(&path, 384).unwrap();
        assert_eq!(reopened.all_chunks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_existing_reads_recorded_dimensionality() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        SqliteStore::open(&path, 384).unwrap();
        let reopened = SqliteStore::open_existing(&path).unwrap();
        assert_eq!(reopened.dimensions(), 384);

        let err = SqliteStore::open_existing(dir.path().join("missing.db")).unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }));
    }
}
