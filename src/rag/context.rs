//! Context retrieval for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::{Result, VidqaError};
use crate::vector_store::TranscriptIndex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds questions and looks up the closest chunks in an index.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, top_k: 4 }
    }

    /// Set the number of chunks returned by [`Retriever::retrieve`].
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve the configured number of chunks for a question.
    pub async fn retrieve(&self, index: &TranscriptIndex, question: &str) -> Result<Vec<ContextChunk>> {
        self.query(index, question, self.top_k).await
    }

    /// Return the `k` chunks most similar to `question`, best first.
    ///
    /// The index must have been built by the same embedding model.
    #[instrument(skip(self, index, question), fields(k = k, indexed = index.len()))]
    pub async fn query(
        &self,
        index: &TranscriptIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<ContextChunk>> {
        self.check_compatible(index)?;

        if k == 0 || index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(question).await?;
        let results = index.search(&query_embedding, k)?;

        debug!(
            "Retrieved {} chunks (best score {:.3})",
            results.len(),
            results.first().map(|r| r.score).unwrap_or_default()
        );

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }

    fn check_compatible(&self, index: &TranscriptIndex) -> Result<()> {
        if index.model_name() != self.embedder.model_name() {
            return Err(VidqaError::VectorStore(format!(
                "Index was built with {} but questions are embedded with {}",
                index.model_name(),
                self.embedder.model_name()
            )));
        }
        if !index.is_empty() && index.dimensions() != self.embedder.dimensions() {
            return Err(VidqaError::VectorStore(format!(
                "Index has {} dimensions but the embedder produces {}",
                index.dimensions(),
                self.embedder.dimensions()
            )));
        }
        Ok(())
    }
}

/// Join chunk texts for the prompt, preserving retrieval order.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
