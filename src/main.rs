//! vidqa CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidqa::cli::{commands, Cli, Commands, ConfigAction};
use vidqa::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidqa={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    let load_settings = || Settings::load_from(Some(&config_path));

    // Execute command
    match cli.command {
        Commands::Ask {
            video,
            question,
            top_k,
            model,
            json,
        } => {
            commands::run_ask(&video, &question, top_k, model, json, load_settings()?).await?;
        }

        Commands::Transcript { video, output } => {
            commands::run_transcript(&video, output, load_settings()?).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, port, load_settings()?).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&load_settings()?, &config_path).await?;
        }

        Commands::Config { action } => {
            // init must work even when the existing file does not parse
            let settings = match action {
                ConfigAction::Init { .. } => Settings::default(),
                _ => load_settings()?,
            };
            commands::run_config(&action, settings, &config_path)?;
        }
    }

    Ok(())
}
