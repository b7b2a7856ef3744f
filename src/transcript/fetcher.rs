//! Transcript fetching with language fallback.

use super::{
    extract_video_id, language_matches, FetchedTranscript, GoogleTranslator, Transcript,
    TranscriptResult, TranscriptSource, Translator, YoutubeTranscriptSource,
};
use crate::config::TranscriptSettings;
use crate::error::{Result, VidqaError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Reason reported when the video has captions turned off.
pub const SUBTITLES_DISABLED: &str = "Transcript not available (subtitles disabled).";

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAttempt {
    /// Track in the preferred language, used as-is.
    Preferred,
    /// Whatever track the video offers, normalized to the preferred language.
    DefaultLanguage,
}

impl FetchAttempt {
    /// Attempts in the order they are tried.
    pub const CHAIN: [FetchAttempt; 2] = [FetchAttempt::Preferred, FetchAttempt::DefaultLanguage];

    fn needs_normalization(self) -> bool {
        matches!(self, FetchAttempt::DefaultLanguage)
    }
}

enum AttemptOutcome {
    Found(FetchedTranscript),
    Failed(VidqaError),
}

/// Fetches a plain-text English transcript for a video.
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    translator: Arc<dyn Translator>,
    preferred_language: String,
    detect_prefix_chars: usize,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn TranscriptSource>, translator: Arc<dyn Translator>) -> Self {
        Self {
            source,
            translator,
            preferred_language: "en".to_string(),
            detect_prefix_chars: 500,
        }
    }

    /// YouTube captions with Google translation, configured from `[transcript]`.
    pub fn from_settings(settings: &TranscriptSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs.max(1));
        let source = Arc::new(YoutubeTranscriptSource::new(timeout)?);
        let translator = Arc::new(GoogleTranslator::new(timeout)?);

        Ok(Self::new(source, translator)
            .with_preferred_language(&settings.preferred_language)
            .with_detect_prefix_chars(settings.detect_prefix_chars))
    }

    /// Set the language requested first and used as the translation target.
    pub fn with_preferred_language(mut self, language: &str) -> Self {
        self.preferred_language = language.to_string();
        self
    }

    /// Set how many leading characters are used for language detection.
    pub fn with_detect_prefix_chars(mut self, chars: usize) -> Self {
        self.detect_prefix_chars = chars;
        self
    }

    /// Fetch the transcript for a video ID or URL.
    ///
    /// Never fails: every problem is reported as [`TranscriptResult::Unavailable`].
    #[instrument(skip(self))]
    pub async fn fetch(&self, video: &str) -> TranscriptResult {
        let Some(video_id) = extract_video_id(video) else {
            return TranscriptResult::Unavailable(format!(
                "Invalid YouTube video ID or URL: {}",
                video
            ));
        };

        let mut last_error = None;

        for attempt in FetchAttempt::CHAIN {
            match self.attempt(&video_id, attempt).await {
                AttemptOutcome::Found(fetched) if attempt.needs_normalization() => {
                    return match self.normalize(&video_id, fetched).await {
                        Ok(transcript) => TranscriptResult::Available(transcript),
                        Err(e) => {
                            warn!("Failed to normalize transcript for {}: {}", video_id, e);
                            TranscriptResult::Unavailable(format!("Transcript not available: {}", e))
                        }
                    };
                }
                AttemptOutcome::Found(fetched) => {
                    info!("Found {} transcript for {}", fetched.language_code, video_id);
                    return TranscriptResult::Available(Transcript {
                        video_id,
                        text: fetched.joined_text(),
                        language: fetched.language_code,
                        translated_from: None,
                    });
                }
                AttemptOutcome::Failed(e) => {
                    debug!("{:?} attempt failed for {}: {}", attempt, video_id, e);
                    last_error = Some(e);
                }
            }
        }

        let reason = match last_error {
            Some(VidqaError::TranscriptsDisabled(_)) => SUBTITLES_DISABLED.to_string(),
            Some(e) => format!("Transcript not available: {}", e),
            None => "Transcript not available.".to_string(),
        };
        warn!("No transcript for {}: {}", video_id, reason);
        TranscriptResult::Unavailable(reason)
    }

    async fn attempt(&self, video_id: &str, attempt: FetchAttempt) -> AttemptOutcome {
        let language = match attempt {
            FetchAttempt::Preferred => Some(self.preferred_language.as_str()),
            FetchAttempt::DefaultLanguage => None,
        };

        match self.source.fetch(video_id, language).await {
            Ok(fetched) => AttemptOutcome::Found(fetched),
            Err(e) => AttemptOutcome::Failed(e),
        }
    }

    /// Detect the language from a prefix of the text and translate when needed.
    async fn normalize(&self, video_id: &str, fetched: FetchedTranscript) -> Result<Transcript> {
        let text = fetched.joined_text();
        let prefix: String = text.chars().take(self.detect_prefix_chars).collect();

        let detected = self.translator.detect(&prefix).await?;
        info!(
            "Default {} track for {} detected as {}",
            fetched.language_code, video_id, detected
        );

        if language_matches(&detected, &self.preferred_language) {
            return Ok(Transcript {
                video_id: video_id.to_string(),
                text,
                language: detected,
                translated_from: None,
            });
        }

        let translated = self
            .translator
            .translate(&text, &detected, &self.preferred_language)
            .await?;

        Ok(Transcript {
            video_id: video_id.to_string(),
            text: translated,
            language: self.preferred_language.clone(),
            translated_from: Some(detected),
        })
    }
}
