//! Overlapping word-window chunker.
//!
//! Splits law text on whitespace into windows of `size` words, each window
//! starting `size - overlap` words after the previous one. Windows are
//! produced while the window start is still inside the text, so the final
//! window can be shorter than `size` (and may consist only of overlap).
//!
//! Dropping the first `overlap` words of every window after the first and
//! concatenating the rest reproduces the original word sequence exactly.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ChunkingError;
use crate::models::Chunk;

/// Default window size, in words.
pub const DEFAULT_CHUNK_SIZE: usize = 300;
/// Default overlap between consecutive windows, in words.
pub const DEFAULT_OVERLAP: usize = 50;

/// Restartable iterator over word windows. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct WordWindows<'a> {
    words: Vec<&'a str>,
    size: usize,
    stride: usize,
    start: usize,
}

impl<'a> WordWindows<'a> {
    /// Build a window iterator, rejecting sizes that cannot make progress.
    pub fn new(text: &'a str, size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if size == 0 {
            return Err(ChunkingError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkingError::OverlapTooLarge { size, overlap });
        }
        Ok(Self {
            words: text.split_whitespace().collect(),
            size,
            stride: size - overlap,
            start: 0,
        })
    }

    /// Total number of words in the source text.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

impl Iterator for WordWindows<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.start >= self.words.len() {
            return None;
        }
        let end = self.start.saturating_add(self.size).min(self.words.len());
        let window = self.words[self.start..end].join(" ");
        self.start = self.start.saturating_add(self.stride);
        Some(window)
    }
}

/// Split `text` into word-joined windows.
///
/// Empty (or whitespace-only) text yields no windows.
pub fn chunk_words(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    Ok(WordWindows::new(text, size, overlap)?.collect())
}

/// Chunk one law document into [`Chunk`]s with contiguous indices from 0.
pub fn chunk_document(
    source_document: &str,
    category: &str,
    text: &str,
    size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    Ok(WordWindows::new(text, size, overlap)?
        .enumerate()
        .map(|(i, window)| make_chunk(source_document, category, i as i64, window))
        .collect())
}

fn make_chunk(source_document: &str, category: &str, index: i64, text: String) -> Chunk {
    let hash = format!("{:x}", Sha256::digest(text.as_bytes()));
    Chunk {
        id: Uuid::new_v4().to_string(),
        text,
        category: category.to_string(),
        source_document: source_document.to_string(),
        chunk_index: index,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    fn rejoin(chunks: &[String], overlap: usize) -> Vec<String> {
        let mut words = Vec::new();
        for (i, c) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            words.extend(c.split_whitespace().skip(skip).map(str::to_string));
        }
        words
    }

    #[test]
    fn test_hundred_words_size_forty_overlap_ten() {
        let text = numbered_words(100);
        let chunks = chunk_words(&text, 40, 10).unwrap();
        assert_eq!(chunks.len(), 4);

        let spans: Vec<(String, String, usize)> = chunks
            .iter()
            .map(|c| {
                let w: Vec<&str> = c.split_whitespace().collect();
                (w[0].to_string(), w[w.len() - 1].to_string(), w.len())
            })
            .collect();
        assert_eq!(spans[0], ("w0".into(), "w39".into(), 40));
        assert_eq!(spans[1], ("w30".into(), "w69".into(), 40));
        assert_eq!(spans[2], ("w60".into(), "w99".into(), 40));
        assert_eq!(spans[3], ("w90".into(), "w99".into(), 10));
    }

    #[test]
    fn test_rejoin_reconstructs_words() {
        for n in [1usize, 7, 39, 40, 41, 95, 100, 257] {
            let text = numbered_words(n);
            let original: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            for (size, overlap) in [(1, 0), (5, 2), (40, 10), (40, 39), (300, 50)] {
                let chunks = chunk_words(&text, size, overlap).unwrap();
                assert_eq!(
                    rejoin(&chunks, overlap),
                    original,
                    "n={} size={} overlap={}",
                    n,
                    size,
                    overlap
                );
            }
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text = numbered_words(100);
        let chunks = chunk_words(&text, 40, 10).unwrap();
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();
            assert_eq!(&prev[prev.len() - 10..], &next[..10]);
        }
    }

    #[test]
    fn test_huge_sizes_do_not_overflow() {
        let chunks = chunk_words("a b c", usize::MAX, usize::MAX - 1).unwrap();
        assert_eq!(chunks, vec!["a b c", "b c", "c"]);
        assert_eq!(chunk_words("a b c", usize::MAX, 0).unwrap(), vec!["a b c"]);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_rejected() {
        assert_eq!(
            chunk_words("a b c", 10, 10),
            Err(ChunkingError::OverlapTooLarge {
                size: 10,
                overlap: 10
            })
        );
        assert!(chunk_words("a b c", 3, 7).is_err());
        assert_eq!(chunk_words("a b c", 0, 0), Err(ChunkingError::ZeroSize));
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_words("", 40, 10).unwrap().is_empty());
        assert!(chunk_words(" \n\t ", 40, 10).unwrap().is_empty());
    }

    #[test]
    fn test_windows_are_restartable() {
        let text = numbered_words(50);
        let windows = WordWindows::new(&text, 20, 5).unwrap();
        let first: Vec<String> = windows.clone().collect();
        let second: Vec<String> = windows.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_document_metadata() {
        let text = numbered_words(100);
        let chunks = chunk_document("prop65/list.txt", "prop65", &text, 40, 10).unwrap();
        assert_eq!(chunks.len(), 4);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
            assert_eq!(c.category, "prop65");
            assert_eq!(c.source_document, "prop65/list.txt");
            assert_eq!(c.hash.len(), 64);
        }
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    fn size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
        prop_oneof![
            (1usize..60).prop_flat_map(|size| (Just(size), 0..size)),
            (0usize..8).prop_map(|k| (usize::MAX - k, usize::MAX - k - 1)),
            (0usize..8).prop_map(|k| (usize::MAX - k, k)),
        ]
    }

    proptest! {
        #[test]
        fn proptest_rejoin_reconstructs_words(
            words in prop::collection::vec("[a-z0-9]{1,8}", 0..200),
            (size, overlap) in size_and_overlap(),
        ) {
            let text = words.join(" ");
            let chunks = chunk_words(&text, size, overlap).unwrap();
            prop_assert_eq!(rejoin(&chunks, overlap), words.clone());
            prop_assert!(chunks.iter().all(|c| c.split_whitespace().count() <= size));
            prop_assert_eq!(chunks.is_empty(), words.is_empty());
        }

        #[test]
        fn proptest_overlap_at_least_size_is_rejected(size in 0usize..1000, extra in 0usize..1000) {
            prop_assert!(chunk_words("a b c", size, size + extra).is_err());
        }
    }
}
