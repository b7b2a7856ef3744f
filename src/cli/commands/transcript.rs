//! Transcript command - print a video's English transcript.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{TranscriptFetcher, TranscriptResult};
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(video: &str, output: Option<String>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;

    let spinner = Output::spinner("Fetching transcript...");
    let result = fetcher.fetch(video).await;
    spinner.finish_and_clear();

    let transcript = match result {
        TranscriptResult::Available(transcript) => transcript,
        TranscriptResult::Unavailable(reason) => {
            Output::error(&reason);
            anyhow::bail!(reason);
        }
    };

    if let Some(lang) = &transcript.translated_from {
        Output::info(&format!("Translated from {} to {}", lang, transcript.language));
    }

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, &transcript.text)?;
            Output::success(&format!(
                "Wrote {} characters to {}",
                transcript.text.chars().count(),
                path.display()
            ));
        }
        None => println!("{}", transcript.text),
    }

    Ok(())
}
