//! RAG response generation.

use super::{context::format_context_for_prompt, Answer, ContextChunk, LanguageModel};
use crate::config::Prompts;
use crate::error::{Result, VidqaError};
use crate::retry::RetryPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Builds the grounded prompt and asks the language model for an answer.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LanguageModel>,
    prompts: Prompts,
    retry: RetryPolicy,
}

impl AnswerSynthesizer {
    /// Create a synthesizer with the default prompt and retry policy.
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            prompts: Prompts::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the timeout and retry budget for model calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fill the answer template with the context and question.
    pub fn build_prompt(&self, context_chunks: &[ContextChunk], question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(context_chunks));
        vars.insert("question".to_string(), question.to_string());

        self.prompts.render_with_custom(&self.prompts.rag.answer, &vars)
    }

    /// Answer `question` from `context_chunks` only.
    #[instrument(skip(self, context_chunks), fields(chunks = context_chunks.len(), model = %self.llm.model_name()))]
    pub async fn synthesize(&self, context_chunks: Vec<ContextChunk>, question: &str) -> Result<Answer> {
        let prompt = self.build_prompt(&context_chunks, question);

        let text = self
            .retry
            .run("language model call", || self.llm.complete(&prompt))
            .await
            .map_err(|e| match e {
                VidqaError::Llm(_) => e,
                other => VidqaError::Llm(other.to_string()),
            })?;

        info!("Generated answer from {} chunks", context_chunks.len());

        Ok(Answer::Grounded {
            text: text.trim().to_string(),
            sources: context_chunks,
        })
    }
}
