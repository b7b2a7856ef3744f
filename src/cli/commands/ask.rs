//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::Answer;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    video: &str,
    question: &str,
    top_k: Option<usize>,
    model: Option<String>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }
    if let Some(model) = model {
        settings.llm.model = model;
    }

    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Reading transcript...");
    let result = orchestrator.run(video, question).await;
    spinner.finish_and_clear();

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    if json {
        let value = serde_json::json!({
            "answer": answer.text(),
            "available": answer.is_available(),
            "sources": answer.sources(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match &answer {
        Answer::Unavailable { reason } => Output::warning(reason),
        Answer::Grounded { text, sources } => {
            println!("\n{}\n", text);

            if !sources.is_empty() {
                Output::header("Sources");
                for source in sources {
                    Output::source(source);
                }
            }
        }
    }

    Ok(())
}
