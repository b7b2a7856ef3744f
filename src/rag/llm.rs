//! Language model access for answer synthesis.

use crate::config::LlmSettings;
use crate::error::{Result, VidqaError};
use crate::openai::create_compatible_client;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Trait for text completion models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single user prompt and return the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Identifier of the model.
    fn model_name(&self) -> &str;
}

/// Chat completions against OpenAI or any OpenAI-compatible API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a model client from the `[llm]` settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let client = create_compatible_client(
            settings.api_base.as_deref(),
            settings.api_key(),
            Duration::from_secs(settings.timeout_secs.max(1)),
        )?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Use a different model name than the configured one.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| VidqaError::Llm(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidqaError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidqaError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| VidqaError::Llm("Empty response from language model".to_string()))?;

        debug!("Model replied with {} chars", answer.len());
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_uses_configured_model() {
        let settings = LlmSettings {
            model: "gemini-2.5-flash".to_string(),
            api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai/".to_string()),
            ..LlmSettings::default()
        };
        let model = OpenAIChatModel::from_settings(&settings).unwrap();
        assert_eq!(model.model_name(), "gemini-2.5-flash");
        assert_eq!(model.with_model("gpt-4o").model_name(), "gpt-4o");
    }
}
