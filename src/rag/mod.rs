//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieves the transcript chunks closest to a question and asks a language
//! model to answer from those chunks only.

pub mod context;
pub mod llm;
mod response;

pub use context::Retriever;
pub use llm::{LanguageModel, OpenAIChatModel};
pub use response::AnswerSynthesizer;

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved chunk handed to the model as context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextChunk {
    /// Position of the chunk in the transcript.
    pub index: usize,
    /// Byte offset of the chunk in the transcript.
    pub start: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            index: result.chunk.index,
            start: result.chunk.start,
            content: result.chunk.text,
            score: result.score,
        }
    }
}

/// Outcome of a question about one video.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Model output grounded in the retrieved chunks (best first).
    Grounded {
        text: String,
        sources: Vec<ContextChunk>,
    },
    /// The transcript could not be obtained.
    Unavailable { reason: String },
}

impl Answer {
    /// The text shown to the user: the model's answer or the unavailability reason.
    pub fn text(&self) -> &str {
        match self {
            Answer::Grounded { text, .. } => text,
            Answer::Unavailable { reason } => reason,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Answer::Grounded { .. })
    }

    pub fn sources(&self) -> &[ContextChunk] {
        match self {
            Answer::Grounded { sources, .. } => sources,
            Answer::Unavailable { .. } => &[],
        }
    }

    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text().to_string();

        if !self.sources().is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in self.sources() {
                output.push_str(&format!(
                    "\n[chunk {}] (score: {:.2}) {}",
                    source.index,
                    source.score,
                    preview(&source.content, 80)
                ));
            }
        }

        output
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
