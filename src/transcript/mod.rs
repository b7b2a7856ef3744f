//! Transcript acquisition for a video.
//!
//! A [`TranscriptFetcher`] walks an ordered list of fetch attempts against a
//! [`TranscriptSource`] and normalizes non-English text to English through a
//! [`Translator`]. Failures are reported as [`TranscriptResult::Unavailable`]
//! rather than errors.

mod fetcher;
mod translate;
mod youtube;

pub use fetcher::{FetchAttempt, TranscriptFetcher};
pub use translate::{split_for_translation, GoogleTranslator};
pub use youtube::{extract_video_id, YoutubeTranscriptSource};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    /// Spoken text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptSnippet {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Caption track content as returned by a [`TranscriptSource`].
#[derive(Debug, Clone)]
pub struct FetchedTranscript {
    /// Language code of the track (e.g. "en", "es-419").
    pub language_code: String,
    /// Whether the track was generated by speech recognition.
    pub is_generated: bool,
    pub snippets: Vec<TranscriptSnippet>,
}

impl FetchedTranscript {
    /// Join all snippet texts with single spaces.
    pub fn joined_text(&self) -> String {
        self.snippets
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Plain-text transcript of one video, normalized to English.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub text: String,
    /// Language of `text`.
    pub language: String,
    /// Source language when the text was machine translated.
    pub translated_from: Option<String>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Outcome of transcript acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptResult {
    Available(Transcript),
    /// Human-readable reason the transcript could not be obtained.
    Unavailable(String),
}

/// Trait for services that serve caption tracks by video id.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the track in `language`, or the default track when `None`.
    async fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<FetchedTranscript>;
}

/// Trait for language detection and machine translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Detect the dominant language of `text`, returning a language code.
    async fn detect(&self, text: &str) -> Result<String>;

    /// Translate `text` from `source` to `target`.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Whether a language code denotes `base` or one of its regional variants.
pub(crate) fn language_matches(code: &str, base: &str) -> bool {
    let code = code.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    code == base || code.starts_with(&format!("{}-", base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_text_uses_single_spaces() {
        let fetched = FetchedTranscript {
            language_code: "en".to_string(),
            is_generated: false,
            snippets: vec![
                TranscriptSnippet::new("The sky", 0.0, 1.0),
                TranscriptSnippet::new("is blue.", 1.0, 1.0),
            ],
        };
        assert_eq!(fetched.joined_text(), "The sky is blue.");
    }

    #[test]
    fn test_language_matches() {
        assert!(language_matches("en", "en"));
        assert!(language_matches("en-GB", "en"));
        assert!(!language_matches("eng", "en"));
        assert!(!language_matches("es", "en"));
    }
}
