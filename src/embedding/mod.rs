//! Embedding generation for semantic search and retrieval.

mod hashing;
#[cfg(feature = "local-embeddings")]
mod local;
mod openai;

pub use hashing::HashingEmbedder;
#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;
}

/// Create the embedder selected in the settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::OpenAI => Ok(Arc::new(OpenAIEmbedder::with_config(
            &settings.model,
            settings.dimensions as usize,
        )?)),
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(settings.dimensions as usize))),
        EmbeddingProvider::Local => create_local_embedder(),
    }
}

#[cfg(feature = "local-embeddings")]
fn create_local_embedder() -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(FastEmbedder::new()?))
}

#[cfg(not(feature = "local-embeddings"))]
fn create_local_embedder() -> Result<Arc<dyn Embedder>> {
    Err(VidqaError::Config(
        "The local embedding provider needs a build with `--features local-embeddings`".to_string(),
    ))
}

/// Check that a batch response has one vector per input.
pub(crate) fn ensure_batch_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(VidqaError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected, actual
        )));
    }
    Ok(())
}
