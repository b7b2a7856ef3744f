//! Local sentence-transformers embeddings via fastembed (ONNX runtime, CPU).

use super::{ensure_batch_len, Embedder};
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DIMENSIONS: usize = 384;

/// all-MiniLM-L6-v2 running on the CPU.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Load the model, downloading it into the user cache directory on first use.
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("vidqa")
            .join("fastembed");

        info!("Loading {} (cache: {})", MODEL_NAME, cache_dir.display());

        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(false),
        )
        .map_err(|e| VidqaError::Embedding(format!("Failed to load {}: {}", MODEL_NAME, e)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VidqaError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let inputs = texts.to_vec();
        let expected = inputs.len();

        // inference is CPU-bound; keep it off the async workers
        let embeddings = tokio::task::spawn_blocking(move || {
            #[allow(unused_mut)]
            let mut model = model
                .lock()
                .map_err(|_| VidqaError::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(inputs, None)
                .map_err(|e| VidqaError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| VidqaError::Embedding(format!("Embedding task failed: {}", e)))??;

        ensure_batch_len(expected, embeddings.len())?;
        debug!("Generated {} local embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
