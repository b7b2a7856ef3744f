//! Per-request embedding index over transcript chunks.

use super::{MemoryVectorStore, SearchResult, VectorStore};
use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, VidqaError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Chunks and their vectors, tagged with the model that produced them.
#[derive(Debug)]
pub struct TranscriptIndex {
    store: MemoryVectorStore,
    model_name: String,
    dimensions: usize,
}

impl TranscriptIndex {
    /// Name of the embedding model the vectors came from.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Exact top-`limit` search by cosine similarity.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.store.search(query_embedding, limit)
    }
}

/// Embeds chunks and builds a [`TranscriptIndex`].
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every chunk in one batch and index the vectors.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len(), model = %self.embedder.model_name()))]
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<TranscriptIndex> {
        if chunks.is_empty() {
            return Err(VidqaError::EmptyTranscript(
                "no chunks to index".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(VidqaError::Embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(VidqaError::Embedding(format!(
                "Embedder {} declares {} dimensions but returned a {}-dimensional vector",
                self.embedder.model_name(),
                dimensions,
                bad.len()
            )));
        }

        let mut store = MemoryVectorStore::new();
        let count = store.insert_batch(chunks, embeddings)?;
        debug!("Indexed {} chunks ({} dimensions)", count, dimensions);

        Ok(TranscriptIndex {
            store,
            model_name: self.embedder.model_name().to_string(),
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use async_trait::async_trait;

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }

        fn dimensions(&self) -> usize {
            1
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    /// Declares one size, returns vectors of another.
    struct OversizedEmbedder;

    #[async_trait]
    impl Embedder for OversizedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 3072])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; 3072]).collect())
        }

        fn dimensions(&self) -> usize {
            1536
        }

        fn model_name(&self) -> &str {
            "text-embedding-3-large"
        }
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, i * 100, t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_one_vector_per_chunk() {
        let indexer = Indexer::new(Arc::new(HashingEmbedder::new(64)));
        let index = indexer
            .build(chunks(&["The sky is blue.", "The grass is green.", "Water is wet."]))
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.dimensions(), 64);
        assert_eq!(index.model_name(), "hashing-64");
    }

    #[tokio::test]
    async fn test_zero_chunks_rejected() {
        let indexer = Indexer::new(Arc::new(HashingEmbedder::new(64)));
        let err = indexer.build(Vec::new()).await.unwrap_err();
        assert!(matches!(err, VidqaError::EmptyTranscript(_)));
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_rejected() {
        let indexer = Indexer::new(Arc::new(ShortEmbedder));
        let err = indexer.build(chunks(&["a", "b"])).await.unwrap_err();
        assert!(matches!(err, VidqaError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_vector_length_mismatch_rejected_at_build() {
        let indexer = Indexer::new(Arc::new(OversizedEmbedder));
        let err = indexer.build(chunks(&["a", "b"])).await.unwrap_err();

        match err {
            VidqaError::Embedding(msg) => {
                assert!(msg.contains("1536"));
                assert!(msg.contains("3072"));
            }
            other => panic!("expected embedding error, got {:?}", other),
        }
    }
}
