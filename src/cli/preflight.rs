//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{Result, VidqaError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs the LLM key, plus the OpenAI key for OpenAI embeddings.
    Ask,
    /// Fetching a transcript needs no credentials.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_env_key(&settings.llm.api_key_env)?;
            if settings.embedding.provider == EmbeddingProvider::OpenAI {
                check_env_key("OPENAI_API_KEY")?;
            }
        }
        Operation::Transcript => {}
    }
    Ok(())
}

/// Check that an API key environment variable is set and non-empty.
pub fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(VidqaError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            name, name
        ))),
        Err(_) => Err(VidqaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}
