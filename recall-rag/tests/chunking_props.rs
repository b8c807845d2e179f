//! Property tests for word-window chunking.

use proptest::prelude::*;
use recall_rag::chunking::{Chunker, WordWindowChunker};

/// Closed-form chunk count: windows advance by `chunk_size - overlap` words
/// and the sequence ends once a window reaches the final word.
fn expected_chunk_count(words: usize, chunk_size: usize, overlap: usize) -> usize {
    if words == 0 {
        return 0;
    }
    let step = chunk_size - overlap;
    usize::max(1, words.saturating_sub(overlap).div_ceil(step))
}

/// A (chunk_size, overlap) pair with overlap strictly below chunk_size.
fn chunk_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..20).prop_flat_map(|size| (Just(size), 0..size))
}

fn arb_words() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{1,8}", 0..120)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn chunk_count_matches_closed_form(
        (chunk_size, overlap) in chunk_params(),
        words in arb_words(),
    ) {
        let chunker = WordWindowChunker::new(chunk_size, overlap).unwrap();
        let chunks = chunker.chunk(&words.join(" "));
        prop_assert_eq!(chunks.len(), expected_chunk_count(words.len(), chunk_size, overlap));
    }

    /// Dropping each later window's leading overlap words and concatenating
    /// reproduces the source text exactly: every word is covered, in order,
    /// with nothing invented.
    #[test]
    fn windows_reassemble_to_the_source(
        (chunk_size, overlap) in chunk_params(),
        words in arb_words(),
    ) {
        let chunker = WordWindowChunker::new(chunk_size, overlap).unwrap();
        let chunks = chunker.chunk(&words.join(" "));

        let mut rebuilt: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_words: Vec<&str> = chunk.split_whitespace().collect();
            let skip = if i == 0 { 0 } else { overlap };
            rebuilt.extend(chunk_words[skip..].iter().map(|w| w.to_string()));
        }
        prop_assert_eq!(rebuilt, words);
    }

    #[test]
    fn consecutive_windows_share_their_boundary_words(
        (chunk_size, overlap) in chunk_params(),
        words in arb_words(),
    ) {
        let chunker = WordWindowChunker::new(chunk_size, overlap).unwrap();
        let chunks = chunker.chunk(&words.join(" "));

        for pair in chunks.windows(2) {
            let a: Vec<&str> = pair[0].split_whitespace().collect();
            let b: Vec<&str> = pair[1].split_whitespace().collect();
            prop_assert_eq!(&a[a.len() - overlap..], &b[..overlap]);
        }
    }

    #[test]
    fn chunking_is_deterministic(
        (chunk_size, overlap) in chunk_params(),
        words in arb_words(),
    ) {
        let chunker = WordWindowChunker::new(chunk_size, overlap).unwrap();
        let text = words.join(" ");
        prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }
}
