//! Language detection and translation through Google Translate's public endpoint.

use super::Translator;
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Longest piece of text sent in one translation request.
const MAX_PIECE_CHARS: usize = 4500;

/// Concurrent translation requests for long transcripts.
const MAX_CONCURRENT_PIECES: usize = 4;

/// Google Translate client.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Create a translator whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VidqaError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: TRANSLATE_URL.to_string(),
        })
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VidqaError::Translation(format!(
                "translate endpoint returned {}",
                response.status()
            )));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn translate_piece(&self, piece: &str, source: &str, target: &str) -> Result<String> {
        let body = self.request(piece, source, target).await?;
        parse_translation(&body)
    }
}

/// Concatenate the translated sentences of a `translate_a/single` response.
pub(crate) fn parse_translation(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| VidqaError::Translation("Unexpected translation response shape".to_string()))?;

    Ok(sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect::<String>())
}

/// Read the detected source language of a `translate_a/single` response.
pub(crate) fn parse_detected_language(body: &Value) -> Result<String> {
    body.get(2)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| VidqaError::Translation("Response carries no detected language".to_string()))
}

/// Split text into pieces of at most `max_chars` characters, cutting at whitespace when possible.
pub fn split_for_translation(text: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if rest.chars().count() <= max_chars {
            pieces.push(rest);
            break;
        }

        // byte offset just past the `max_chars`-th char
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let cut = rest[..limit]
            .rfind(char::is_whitespace)
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        pieces.push(rest[..cut].trim_end());
        rest = rest[cut..].trim_start();
    }

    pieces
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn detect(&self, text: &str) -> Result<String> {
        let body = self.request(text, "auto", "en").await?;
        let language = parse_detected_language(&body)?;
        debug!("Detected language: {}", language);
        Ok(language)
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let pieces = split_for_translation(text, MAX_PIECE_CHARS);
        debug!("Translating {} pieces from {} to {}", pieces.len(), source, target);

        let pieces: Vec<String> = pieces.into_iter().map(str::to_string).collect();

        // each future owns its piece so the stream stays Send
        let translated: Vec<String> = stream::iter(pieces)
            .map(|piece| async move { self.translate_piece(&piece, source, target).await })
            .buffered(MAX_CONCURRENT_PIECES)
            .try_collect()
            .await?;

        Ok(translated.join(" "))
    }
}
