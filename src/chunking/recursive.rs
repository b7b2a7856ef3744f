//! Recursive character splitting.
//!
//! Tries separators from coarse to fine (paragraph, line, word, character),
//! merges small pieces up to the chunk size and slides a window of at most
//! `overlap` characters into the next chunk.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::error::Result;
use std::collections::VecDeque;
use tracing::{debug, warn};

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text on natural boundaries before falling back to a hard cut.
pub struct RecursiveChunker {
    separators: Vec<String>,
}

impl RecursiveChunker {
    pub fn new() -> Self {
        Self::with_separators(DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect())
    }

    /// Use custom separators, tried in order. An empty separator means a per-character cut.
    pub fn with_separators(separators: Vec<String>) -> Self {
        Self { separators }
    }

    /// Split `text`, which begins at byte `base` of the source, into `(start, text)` chunks.
    fn split_text(
        &self,
        text: &str,
        base: usize,
        separators: &[String],
        config: &ChunkingConfig,
    ) -> Vec<(usize, String)> {
        let (separator, remaining) = pick_separator(text, separators);
        let pieces = split_keeping_separator(text, separator);

        let mut chunks = Vec::new();
        let mut small: Vec<Piece> = Vec::new();

        for (offset, piece) in pieces {
            if char_len(piece) < config.chunk_size {
                small.push((base + offset, piece));
                continue;
            }

            if !small.is_empty() {
                chunks.extend(merge_pieces(&small, config));
                small.clear();
            }

            if remaining.is_empty() {
                chunks.extend(trimmed(base + offset, piece));
            } else {
                chunks.extend(self.split_text(piece, base + offset, remaining, config));
            }
        }

        if !small.is_empty() {
            chunks.extend(merge_pieces(&small, config));
        }

        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
        config.validate()?;

        let chunks: Vec<Chunk> = self
            .split_text(text, 0, &self.separators, config)
            .into_iter()
            .enumerate()
            .map(|(index, (start, chunk_text))| Chunk::new(index, start, chunk_text))
            .collect();

        debug!(
            "Split {} chars into {} chunks (size {}, overlap {})",
            char_len(text),
            chunks.len(),
            config.chunk_size,
            config.overlap
        );

        Ok(chunks)
    }
}

/// A slice of the source text and its byte offset.
type Piece<'t> = (usize, &'t str);

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// First separator present in the text, plus the finer separators after it.
fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, keeping it at the start of the following piece.
///
/// Offsets are relative to `text`.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<Piece<'t>> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| (i, &text[i..i + c.len_utf8()]))
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push((start, &text[start..idx]));
        }
        start = idx;
    }
    pieces.push((start, &text[start..]));
    pieces.retain(|(_, p)| !p.is_empty());
    pieces
}

/// Greedily merge consecutive pieces into chunks of at most `chunk_size` chars.
fn merge_pieces(pieces: &[Piece], config: &ChunkingConfig) -> Vec<(usize, String)> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<Piece> = VecDeque::new();
    let mut total = 0;

    for &(offset, piece) in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            if total > config.chunk_size {
                warn!(
                    "Created a chunk of {} chars, longer than the limit of {}",
                    total, config.chunk_size
                );
            }
            chunks.extend(join_window(&window));

            // keep at most `overlap` chars, and leave room for the incoming piece
            while total > config.overlap || (total + len > config.chunk_size && total > 0) {
                match window.pop_front() {
                    Some((_, first)) => total -= char_len(first),
                    None => break,
                }
            }
        }

        window.push_back((offset, piece));
        total += len;
    }

    chunks.extend(join_window(&window));

    chunks
}

/// Join adjacent pieces. They are contiguous in the source, so the first
/// piece's offset locates the joined text.
fn join_window(window: &VecDeque<Piece>) -> Option<(usize, String)> {
    let (start, _) = *window.front()?;
    let joined: String = window.iter().map(|(_, p)| *p).collect();
    trimmed(start, &joined)
}

/// Trim whitespace and shift `start` past what was trimmed from the front.
fn trimmed(start: usize, text: &str) -> Option<(usize, String)> {
    let leading = text.len() - text.trim_start().len();
    let body = text.trim();
    if body.is_empty() {
        None
    } else {
        Some((start + leading, body.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
        RecursiveChunker::new()
            .split(text, &ChunkingConfig::new(chunk_size, overlap).unwrap())
            .unwrap()
    }

    /// Longest prefix of `next` that is also a suffix of `prev`, in chars.
    fn shared_chars(prev: &str, next: &str) -> usize {
        next.char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .filter(|&end| prev.ends_with(&next[..end]))
            .map(|end| char_len(&next[..end]))
            .max()
            .unwrap_or(0)
    }

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "The sky is blue. The grass is green.";
        let chunks = split(text, 1000, 200);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split("", 1000, 200).is_empty());
        assert!(split("   \n\n  ", 1000, 200).is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let text = numbered_words(400);
        let chunks = split(&text, 100, 20);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 100, "chunk too long: {}", chunk.char_len());
            assert_eq!(&text[chunk.start..chunk.end()], chunk.text);
        }

        for pair in chunks.windows(2) {
            let shared = shared_chars(&pair[0].text, &pair[1].text);
            assert!(shared > 0, "no overlap between {:?} and {:?}", pair[0].text, pair[1].text);
            assert!(shared <= 20, "overlap of {} exceeds 20", shared);
            assert!(pair[1].start > pair[0].start);
        }
    }

    #[test]
    fn test_every_word_is_covered() {
        let text = numbered_words(300);
        let chunks = split(&text, 120, 30);

        for i in 0..300 {
            let word = format!("word{}", i);
            assert!(
                chunks
                    .iter()
                    .any(|c| c.text.split(' ').any(|w| w == word)),
                "{} missing",
                word
            );
        }
    }

    #[test]
    fn test_zero_overlap_partitions_words() {
        let text = numbered_words(200);
        let chunks = split(&text, 80, 0);

        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_paragraph_boundaries_preferred() {
        let first = "alpha ".repeat(12).trim_end().to_string();
        let second = "omega ".repeat(12).trim_end().to_string();
        let text = format!("{}\n\n{}", first, second);

        let chunks = split(&text, 100, 0);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, first);
        assert_eq!(chunks[1].text, second);
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let text = "x".repeat(250);
        let chunks = split(&text, 100, 20);

        let lengths: Vec<usize> = chunks.iter().map(|c| c.char_len()).collect();
        assert_eq!(lengths, vec![100, 100, 90]);
        assert_eq!(chunks[1].start, 80);
    }

    #[test]
    fn test_multibyte_text_measured_in_chars() {
        let text = "日本語のテキスト ".repeat(50);
        let chunks = split(&text, 40, 10);

        for chunk in &chunks {
            assert!(chunk.char_len() <= 40);
            assert!(text.is_char_boundary(chunk.start));
        }
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a b  c", " "),
            vec![(0, "a"), (1, " b"), (3, " "), (4, " c")]
        );
        assert_eq!(split_keeping_separator(" a", " "), vec![(0, " a")]);
        assert_eq!(split_keeping_separator("ab", ""), vec![(0, "a"), (1, "b")]);
    }

    #[test]
    fn test_offsets_on_repetitive_text() {
        let text = "la la la la la la la la la la\n\nla la la la la la la la la la\n".repeat(8);
        let chunks = split(&text, 24, 9);

        assert!(chunks.len() > 10);
        for chunk in &chunks {
            assert_eq!(&text[chunk.start..chunk.end()], chunk.text);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].start > pair[0].start);
        }
    }

    #[test]
    fn test_repeated_paragraphs_get_distinct_offsets() {
        let paragraph = "same words again";
        let text = [paragraph; 4].join("\n\n");
        let chunks = split(&text, 20, 0);

        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 18, 36, 54]);
        assert!(chunks.iter().all(|c| c.text == paragraph));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChunkingConfig {
            chunk_size: 10,
            overlap: 11,
        };
        assert!(RecursiveChunker::new().split("some text", &config).is_err());
    }
}
