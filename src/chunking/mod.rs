//! Text chunking for embedding and retrieval.
//!
//! Transcripts are split into bounded, overlapping chunks so that each one
//! fits an embedding model's input and context carries across boundaries.

mod recursive;

pub use recursive::RecursiveChunker;

use crate::error::{Result, VidqaError};
use serde::{Deserialize, Serialize};

/// A contiguous piece of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the sequence.
    pub index: usize,
    /// Byte offset of the chunk in the source text.
    pub start: usize,
    /// Text content of this chunk.
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, start: usize, text: String) -> Self {
        Self { index, start, text }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Byte offset one past the end of the chunk in the source text.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters of context carried into the next chunk.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(VidqaError::InvalidInput(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if self.overlap > self.chunk_size {
            return Err(VidqaError::InvalidInput(format!(
                "chunk overlap ({}) is larger than chunk size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
        }
    }
}

/// Trait for text chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks. Empty text yields no chunks.
    fn split(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>>;
}
