//! Word-window document chunking.
//!
//! This module provides the [`Chunker`] trait and [`WordWindowChunker`],
//! which splits text into overlapping fixed-size word windows.

use crate::error::{RecallError, Result};

/// A strategy for splitting raw document text into chunks.
///
/// Implementations are pure: no side effects, deterministic output, and the
/// returned chunks appear in source-text order.
pub trait Chunker: Send + Sync {
    /// Split text into an ordered sequence of chunks.
    ///
    /// Returns an empty `Vec` for empty (or whitespace-only) text; callers
    /// treat a zero-chunk document as a no-op ingestion, not an error.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Splits text into overlapping windows of whitespace-separated words.
///
/// Each window holds `chunk_size` consecutive words and the window start
/// advances by `chunk_size - overlap` words, so consecutive windows share
/// their boundary words. The overlap is deliberate redundancy: it keeps
/// content that straddles a window boundary retrievable from at least one
/// window. The final window may be shorter than `chunk_size`.
///
/// # Example
///
/// ```rust
/// use recall_rag::chunking::{Chunker, WordWindowChunker};
///
/// let chunker = WordWindowChunker::new(4, 1).unwrap();
/// let chunks = chunker.chunk("one two three four five six seven eight nine ten");
/// assert_eq!(
///     chunks,
///     ["one two three four", "four five six seven", "seven eight nine ten"],
/// );
/// ```
#[derive(Debug, Clone)]
pub struct WordWindowChunker {
    chunk_size: usize,
    overlap: usize,
}

impl WordWindowChunker {
    /// Create a chunker producing `chunk_size`-word windows whose starts
    /// advance by `chunk_size - overlap` words.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Config`] if `chunk_size` is zero or
    /// `overlap >= chunk_size`; either makes the window step non-positive.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RecallError::Config("chunk_size must be greater than zero".to_string()));
        }
        if overlap >= chunk_size {
            return Err(RecallError::Config(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }
}

impl Chunker for WordWindowChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_words_size_four_overlap_one() {
        let chunker = WordWindowChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk("one two three four five six seven eight nine ten");
        assert_eq!(
            chunks,
            vec!["one two three four", "four five six seven", "seven eight nine ten"],
        );
    }

    #[test]
    fn final_window_may_be_shorter() {
        let chunker = WordWindowChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk("one two three four five");
        assert_eq!(chunks, vec!["one two three four", "four five"]);
    }

    #[test]
    fn text_shorter_than_window_yields_single_chunk() {
        let chunker = WordWindowChunker::new(10, 2).unwrap();
        assert_eq!(chunker.chunk("just three words"), vec!["just three words"]);
    }

    #[test]
    fn empty_and_whitespace_text_yield_no_chunks() {
        let chunker = WordWindowChunker::new(4, 1).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t  ").is_empty());
    }

    #[test]
    fn no_overlap_produces_disjoint_windows() {
        let chunker = WordWindowChunker::new(2, 0).unwrap();
        let chunks = chunker.chunk("a b c d e");
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn collapses_arbitrary_whitespace() {
        let chunker = WordWindowChunker::new(3, 0).unwrap();
        let chunks = chunker.chunk("a\tb\n\nc   d");
        assert_eq!(chunks, vec!["a b c", "d"]);
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(matches!(WordWindowChunker::new(4, 4), Err(RecallError::Config(_))));
        assert!(matches!(WordWindowChunker::new(4, 7), Err(RecallError::Config(_))));
        assert!(matches!(WordWindowChunker::new(0, 0), Err(RecallError::Config(_))));
    }
}
