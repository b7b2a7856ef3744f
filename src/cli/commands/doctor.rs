//! Doctor command - verify configuration, credentials and connectivity.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use console::style;
use std::path::Path;
use std::time::Duration;

/// Endpoints the pipeline talks to without credentials.
const ENDPOINTS: [(&str, &str); 2] = [
    ("YouTube", "https://www.youtube.com/"),
    ("Google Translate", "https://translate.googleapis.com/"),
];

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("vidqa Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    let config_checks = vec![check_config_file(config_path), check_prompts_dir(settings)];
    print_section("Configuration", &config_checks);
    checks.extend(config_checks);

    let mut api_checks = vec![check_api_key(&settings.llm.api_key_env)];
    if settings.embedding.provider == EmbeddingProvider::OpenAI
        && settings.llm.api_key_env != "OPENAI_API_KEY"
    {
        api_checks.push(check_api_key("OPENAI_API_KEY"));
    }
    api_checks.push(check_embedding_provider(settings.embedding.provider));
    print_section("Models", &api_checks);
    checks.extend(api_checks);

    let mut network_checks = Vec::new();
    for (name, url) in ENDPOINTS {
        network_checks.push(check_endpoint(name, url).await);
    }
    print_section("Connectivity", &network_checks);
    checks.extend(network_checks);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using vidqa.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! vidqa is ready to use.");
    }

    Ok(())
}

/// Check that an API key environment variable is configured.
fn check_api_key(var: &str) -> CheckResult {
    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => {
            CheckResult::error(var, "empty", &format!("Set with: export {}='...'", var))
        }
        Ok(key) => CheckResult::ok(var, &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(var, "not set", &format!("Set with: export {}='...'", var)),
    }
}

/// Show only the first and last characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_embedding_provider(provider: EmbeddingProvider) -> CheckResult {
    let name = "Embeddings";
    match provider {
        EmbeddingProvider::OpenAI => CheckResult::ok(name, "openai"),
        EmbeddingProvider::Hashing => CheckResult::warning(
            name,
            "hashing (offline, keyword-level similarity)",
            "Set embedding.provider = \"openai\" or \"local\" for semantic retrieval",
        ),
        EmbeddingProvider::Local if cfg!(feature = "local-embeddings") => {
            CheckResult::ok(name, "local (all-MiniLM-L6-v2)")
        }
        EmbeddingProvider::Local => CheckResult::error(
            name,
            "local provider selected but not compiled in",
            "Rebuild with: cargo install vidqa --features local-embeddings",
        ),
    }
}

async fn check_endpoint(name: &str, url: &str) -> CheckResult {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => return CheckResult::error(name, &format!("HTTP client error: {}", e), ""),
    };

    match client.head(url).send().await {
        Ok(response) => CheckResult::ok(name, &format!("reachable ({})", response.status())),
        Err(e) => CheckResult::error(
            name,
            &format!("unreachable: {}", e),
            "Check your network connection or proxy settings",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vidqa config init",
        )
    }
}

fn check_prompts_dir(settings: &Settings) -> CheckResult {
    match &settings.prompts.custom_dir {
        None => CheckResult::ok("Prompts", "built-in"),
        Some(dir) => {
            let path = Settings::expand_path(dir);
            if path.join("rag.toml").exists() {
                CheckResult::ok("Prompts", &format!("{}", path.join("rag.toml").display()))
            } else {
                CheckResult::warning(
                    "Prompts",
                    &format!("no rag.toml in {}", path.display()),
                    "Built-in prompt will be used",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-proj-abcdefghijklmnop"), "sk-proj...mnop");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_missing_config_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_config_file(&dir.path().join("config.toml"));
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[test]
    fn test_hashing_provider_is_warning() {
        let result = check_embedding_provider(EmbeddingProvider::Hashing);
        assert_eq!(result.status, CheckStatus::Warning);
    }
}
