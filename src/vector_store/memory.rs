//! In-memory vector store implementation.
//!
//! Exact search: every query is scored against every stored vector.

use super::{cosine_similarity, IndexedChunk, SearchResult, VectorStore};
use crate::chunking::Chunk;
use crate::error::{Result, VidqaError};
use std::cmp::Ordering;

/// In-memory vector store, owned by a single pipeline run.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    entries: Vec<IndexedChunk>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryVectorStore {
    fn insert_batch(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(VidqaError::VectorStore(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let expected = self
            .dimensions()
            .or_else(|| embeddings.first().map(Vec::len));
        if let Some(dims) = expected {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dims) {
                return Err(VidqaError::VectorStore(format!(
                    "Embedding has {} dimensions, index expects {}",
                    bad.len(),
                    dims
                )));
            }
        }

        let count = chunks.len();
        self.entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
        );
        Ok(count)
    }

    fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        if let Some(dims) = self.dimensions() {
            if query_embedding.len() != dims {
                return Err(VidqaError::VectorStore(format!(
                    "Query has {} dimensions, index expects {}",
                    query_embedding.len(),
                    dims
                )));
            }
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // best score first, earlier chunk wins ties
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.index.cmp(&b.chunk.index))
        });
        results.truncate(limit);

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }
}
