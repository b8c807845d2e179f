//! The `recall` command line: ingest personal documents into a local
//! semantic index and search them.
//!
//! Text extraction from binary formats is out of scope here; `ingest` reads
//! plain-text and markdown files. Point `--db` at the same file across
//! invocations to build up one index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use recall_rag::{
    DocumentStore, EmbeddingProvider, FastEmbedProvider, IngestionPipeline, RecallConfig,
    Retriever, SqliteStore, WordWindowChunker,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recall", version, about = "Semantic search over your own documents")]
struct Cli {
    /// Path to the index database.
    #[arg(long, global = true, default_value = "recall.db")]
    db: PathBuf,

    /// Sentence-embedding model.
    #[arg(long, global = true, default_value = recall_rag::config::DEFAULT_MODEL)]
    model: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a plain-text or markdown file.
    Ingest {
        /// File to read.
        file: PathBuf,
        /// Display name for the document; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        /// Words per chunk window.
        #[arg(long, default_value_t = 500)]
        chunk_size: usize,
        /// Words shared between consecutive windows.
        #[arg(long, default_value_t = 50)]
        chunk_overlap: usize,
    },
    /// Search the index for the most relevant passages.
    Search {
        query: String,
        /// Number of results to return.
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// Drop results scoring below this floor.
        #[arg(long)]
        floor: Option<f32>,
    },
    /// List indexed documents.
    List,
    /// Print a document's stored text.
    Show { id: i64 },
    /// Delete a document and all its chunks.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest { file, name, chunk_size, chunk_overlap } => {
            ingest(&cli.db, &cli.model, &file, name, chunk_size, chunk_overlap).await
        }
        Command::Search { query, top_k, floor } => {
            search(&cli.db, &cli.model, &query, top_k, floor).await
        }
        Command::List => list(&cli.db).await,
        Command::Show { id } => show(&cli.db, id).await,
        Command::Delete { id } => delete(&cli.db, id).await,
    }
}

async fn ingest(
    db: &Path,
    model: &str,
    file: &Path,
    name: Option<String>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> anyhow::Result<()> {
    let raw_text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    });

    let config = RecallConfig::builder()
        .chunk_size(chunk_size)
        .chunk_overlap(chunk_overlap)
        .model(model)
        .build()?;

    let provider = Arc::new(FastEmbedProvider::load(&config.model)?);
    let store = Arc::new(SqliteStore::open(db, provider.dimensions())?);
    let pipeline = IngestionPipeline::builder()
        .chunker(Arc::new(WordWindowChunker::new(config.chunk_size, config.chunk_overlap)?))
        .embedding_provider(provider)
        .store(store)
        .build()?;

    let report = pipeline.ingest(&name, &raw_text).await?;
    if report.chunk_count == 0 {
        println!(
            "Indexed '{name}' as document {}, but it produced no searchable text.",
            report.document_id
        );
    } else {
        println!(
            "Indexed '{name}' as document {} ({} chunks).",
            report.document_id, report.chunk_count
        );
    }
    Ok(())
}

async fn search(
    db: &Path,
    model: &str,
    query: &str,
    top_k: usize,
    floor: Option<f32>,
) -> anyhow::Result<()> {
    let mut builder = RecallConfig::builder().top_k(top_k).model(model);
    if let Some(floor) = floor {
        builder = builder.score_floor(floor);
    }
    let config = builder.build()?;

    let provider = Arc::new(FastEmbedProvider::load(&config.model)?);
    let store = Arc::new(SqliteStore::open(db, provider.dimensions())?);
    let mut retriever = Retriever::new(provider, store);
    if let Some(floor) = config.score_floor {
        retriever = retriever.with_score_floor(floor);
    }

    let results = retriever.search(query, config.top_k).await?;
    if results.is_empty() {
        println!("No matching passages.");
        return Ok(());
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. [{:.4}] {} (document {}, chunk {})",
            rank + 1,
            result.score,
            result.document_name,
            result.document_id,
            result.chunk_id,
        );
        println!("    {}", excerpt(&result.text, 300));
    }
    Ok(())
}

async fn list(db: &Path) -> anyhow::Result<()> {
    let store = open_index(db)?;
    let documents = store.list_documents().await?;
    if documents.is_empty() {
        println!("No documents indexed.");
        return Ok(());
    }
    println!("{:>4}  {:<32}  {:>7}  {:>10}  uploaded", "id", "name", "chunks", "size");
    for doc in documents {
        println!(
            "{:>4}  {:<32}  {:>7}  {:>10}  {}",
            doc.id,
            doc.name,
            doc.chunk_count,
            format_size(doc.size_bytes),
            doc.uploaded_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

async fn show(db: &Path, id: i64) -> anyhow::Result<()> {
    let store = open_index(db)?;
    let Some(doc) = store.get_document(id).await? else {
        bail!("document {id} not found");
    };
    println!(
        "{} (document {}, {} chunks, uploaded {})",
        doc.name,
        doc.id,
        doc.chunk_count,
        doc.uploaded_at.format("%Y-%m-%d %H:%M"),
    );
    println!();
    println!("{}", doc.text);
    Ok(())
}

async fn delete(db: &Path, id: i64) -> anyhow::Result<()> {
    let store = open_index(db)?;
    if !store.delete_document(id).await? {
        bail!("document {id} not found");
    }
    println!("Deleted document {id} and its chunks.");
    Ok(())
}

/// Open an index without loading a model; listing and deleting only need
/// the dimensionality already recorded in the database.
fn open_index(db: &Path) -> anyhow::Result<SqliteStore> {
    if !db.exists() {
        bail!("no index at {} (ingest a document first)", db.display());
    }
    Ok(SqliteStore::open_existing(db)?)
}

/// Trim display text to at most `max_chars` characters on a char boundary.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

fn format_size(bytes: i64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
