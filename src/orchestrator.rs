//! Pipeline orchestrator for vidqa.
//!
//! Runs one question through fetch, chunk, index, retrieve and answer.

use crate::chunking::{Chunker, ChunkingConfig, RecursiveChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VidqaError};
use crate::rag::{Answer, AnswerSynthesizer, LanguageModel, OpenAIChatModel, Retriever};
use crate::retry::RetryPolicy;
use crate::transcript::{TranscriptFetcher, TranscriptResult};
use crate::vector_store::Indexer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// The main orchestrator for the vidqa pipeline.
///
/// Holds only shared collaborators; every call to [`Orchestrator::run`]
/// builds and drops its own transcript, chunks and index.
pub struct Orchestrator {
    fetcher: TranscriptFetcher,
    chunker: Arc<dyn Chunker>,
    chunking: ChunkingConfig,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl Orchestrator {
    /// Create an orchestrator from configuration.
    pub fn new(settings: &Settings) -> Result<Self> {
        // command-line overrides are applied after load, so check again
        settings.validate()?;

        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;
        let embedder = create_embedder(&settings.embedding)?;
        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);

        info!(
            "Using {} embeddings and {} for answers",
            embedder.model_name(),
            llm.model_name()
        );

        let retry = RetryPolicy::new(
            Duration::from_secs(settings.llm.timeout_secs.max(1)),
            settings.llm.max_retries,
        );

        Ok(
            Self::with_components(fetcher, Arc::new(RecursiveChunker::new()), embedder, llm)
                .with_chunking(ChunkingConfig::new(
                    settings.chunking.chunk_size,
                    settings.chunking.chunk_overlap,
                )?)
                .with_top_k(settings.retrieval.top_k)
                .with_prompts(prompts)
                .with_retry(retry),
        )
    }

    /// Create an orchestrator with custom components and default tuning.
    pub fn with_components(
        fetcher: TranscriptFetcher,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            fetcher,
            chunker,
            chunking: ChunkingConfig::default(),
            retriever: Retriever::new(embedder.clone()),
            embedder,
            synthesizer: AnswerSynthesizer::new(llm),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Set how many chunks are handed to the model.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.retriever = self.retriever.with_top_k(top_k);
        self
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.synthesizer = self.synthesizer.with_prompts(prompts);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.synthesizer = self.synthesizer.with_retry(retry);
        self
    }

    /// Answer `question` about the video identified by `video` (id or URL).
    ///
    /// A transcript that cannot be obtained is an [`Answer::Unavailable`],
    /// not an error. Every later failure is returned as `Err`.
    #[instrument(skip(self, question), fields(video = %video))]
    pub async fn run(&self, video: &str, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(VidqaError::InvalidInput("question must not be empty".to_string()));
        }

        let started = Instant::now();

        let transcript = match self.fetcher.fetch(video).await {
            TranscriptResult::Available(transcript) => transcript,
            TranscriptResult::Unavailable(reason) => {
                info!("Transcript unavailable: {}", reason);
                return Ok(Answer::Unavailable { reason });
            }
        };
        debug!(
            "Fetched {} chars of {} transcript in {:?}",
            transcript.text.len(),
            transcript.language,
            started.elapsed()
        );

        if transcript.is_empty() {
            return Err(VidqaError::EmptyTranscript(transcript.video_id));
        }

        let chunks = self.chunker.split(&transcript.text, &self.chunking)?;
        debug!("Split transcript into {} chunks", chunks.len());

        let index = Indexer::new(self.embedder.clone()).build(chunks).await?;
        let context = self.retriever.retrieve(&index, question).await?;
        debug!("Retrieved {} of {} chunks", context.len(), index.len());

        let answer = self.synthesizer.synthesize(context, question).await?;

        info!(
            "Answered question about {} in {:.1}s",
            transcript.video_id,
            started.elapsed().as_secs_f64()
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::embedding::HashingEmbedder;
    use crate::transcript::{FetchedTranscript, TranscriptSnippet, TranscriptSource, Translator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VIDEO: &str = "dQw4w9WgXcQ";

    /// Serves one English track, or reports captions as disabled.
    struct FakeSource {
        text: Option<String>,
    }

    #[async_trait]
    impl TranscriptSource for FakeSource {
        async fn fetch(&self, video_id: &str, _language: Option<&str>) -> Result<FetchedTranscript> {
            let text = self
                .text
                .as_ref()
                .ok_or_else(|| VidqaError::TranscriptsDisabled(video_id.to_string()))?;
            Ok(FetchedTranscript {
                language_code: "en".to_string(),
                is_generated: false,
                snippets: vec![TranscriptSnippet::new(text.as_str(), 0.0, 5.0)],
            })
        }
    }

    struct NoTranslation;

    #[async_trait]
    impl Translator for NoTranslation {
        async fn detect(&self, _text: &str) -> Result<String> {
            Ok("en".to_string())
        }

        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    #[derive(Default)]
    struct CountingChunker {
        calls: AtomicUsize,
    }

    impl Chunker for CountingChunker {
        fn split(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RecursiveChunker::new().split(text, config)
        }
    }

    #[derive(Default)]
    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text).await
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
    }

    /// Answers "blue" only when the prompt's context says so.
    #[derive(Default)]
    struct ContextReadingModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for ContextReadingModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let context = prompt
                .split("don't know.")
                .nth(1)
                .and_then(|rest| rest.split("Question:").next())
                .unwrap_or_default();
            if context.contains("sky is blue") {
                Ok("The sky is blue.".to_string())
            } else {
                Ok("I don't know.".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "context-reader"
        }
    }

    struct Harness {
        chunker: Arc<CountingChunker>,
        embedder: Arc<CountingEmbedder>,
        model: Arc<ContextReadingModel>,
        orchestrator: Orchestrator,
    }

    fn harness(transcript: Option<&str>) -> Harness {
        let chunker = Arc::new(CountingChunker::default());
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ContextReadingModel::default());
        let fetcher = TranscriptFetcher::new(
            Arc::new(FakeSource {
                text: transcript.map(str::to_string),
            }),
            Arc::new(NoTranslation),
        );

        let orchestrator =
            Orchestrator::with_components(fetcher, chunker.clone(), embedder.clone(), model.clone())
                .with_retry(RetryPolicy {
                    timeout: Duration::from_secs(5),
                    max_retries: 1,
                    backoff: Duration::ZERO,
                });

        Harness {
            chunker,
            embedder,
            model,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_unavailable_transcript_short_circuits() {
        let h = harness(None);

        let answer = h.orchestrator.run(VIDEO, "What is this about?").await.unwrap();

        assert_eq!(
            answer,
            Answer::Unavailable {
                reason: "Transcript not available (subtitles disabled).".to_string()
            }
        );
        assert_eq!(h.chunker.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_video_is_unavailable() {
        let h = harness(Some("anything"));
        let answer = h.orchestrator.run("not a video", "Why?").await.unwrap();
        assert!(!answer.is_available());
        assert!(answer.text().starts_with("Invalid YouTube video ID or URL"));
    }

    #[tokio::test]
    async fn test_end_to_end_answer_from_best_chunk() {
        let mut h = harness(Some("The sky is blue. The grass is green."));
        h.orchestrator = h
            .orchestrator
            .with_chunking(ChunkingConfig::new(20, 0).unwrap())
            .with_top_k(1);

        let answer = h
            .orchestrator
            .run(VIDEO, "What color is the sky?")
            .await
            .unwrap();

        let Answer::Grounded { text, sources } = answer else {
            panic!("expected a grounded answer");
        };
        assert!(text.contains("blue"));
        assert_eq!(sources.len(), 1);
        assert!(sources[0].content.contains("sky is blue"));
        assert_eq!(h.model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.chunker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_transcript_is_single_chunk() {
        let h = harness(Some("The sky is blue. The grass is green."));

        let answer = h.orchestrator.run(VIDEO, "What color is the grass?").await.unwrap();

        assert_eq!(answer.sources().len(), 1);
        assert_eq!(answer.sources()[0].content, "The sky is blue. The grass is green.");
    }

    #[tokio::test]
    async fn test_empty_transcript_fails_without_model_call() {
        let h = harness(Some("   "));

        let err = h.orchestrator.run(VIDEO, "Anything?").await.unwrap_err();

        assert!(matches!(err, VidqaError::EmptyTranscript(_)));
        assert_eq!(h.model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let h = harness(Some("The sky is blue."));
        let err = h.orchestrator.run(VIDEO, "  ").await.unwrap_err();
        assert!(matches!(err, VidqaError::InvalidInput(_)));
        assert_eq!(h.chunker.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_top_k_rejected_at_construction() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 0;

        match Orchestrator::new(&settings) {
            Err(VidqaError::Config(msg)) => assert!(msg.contains("top_k")),
            Err(other) => panic!("expected config error, got {:?}", other),
            Ok(_) => panic!("top_k = 0 was accepted"),
        }
    }
}
