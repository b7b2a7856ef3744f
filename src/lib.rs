//! vidqa - Question answering over YouTube transcripts
//!
//! Answers a natural-language question about a video using only what is said
//! in it: the transcript is fetched (and translated to English if needed),
//! split into overlapping chunks, embedded into an in-memory index, and the
//! chunks closest to the question are handed to a language model.
//!
//! # Architecture
//!
//! - `transcript` - Transcript fetching with language fallback and translation
//! - `chunking` - Recursive character chunking
//! - `embedding` - Embedding generation (OpenAI, local, hashing)
//! - `vector_store` - In-memory cosine index
//! - `rag` - Retrieval and grounded answer synthesis
//! - `orchestrator` - Pipeline coordination
//! - `config` - Configuration and prompt templates
//! - `cli` - Command line and HTTP surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use vidqa::config::Settings;
//! use vidqa::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let answer = orchestrator
//!         .run("dQw4w9WgXcQ", "What is the song about?")
//!         .await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retry;
pub mod transcript;
pub mod vector_store;

pub use error::{Result, VidqaError};
