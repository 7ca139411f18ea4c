use std::path::PathBuf;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::cli::commands::ScanOptions;
use crate::config::{self, ApiSourceConfig, DigfootConfig, StackExchangeConfig, SourcesConfig};
use crate::errors::{DigfootError, RetryConfig};
use crate::identity::EmailAddress;
use crate::pipeline::state::{DEFAULT_MAX_RESULTS, DEFAULT_MAX_VARIATIONS};
use crate::pipeline::window::parse_window;
use crate::pipeline::{ScanEvent, ScanOrchestrator, ScanSettings, ScanSummary};
use crate::reporting::{search_banner, summary_lines, ScanProgress};
use tracing::{info, warn};

pub async fn handle_scan(email: &str, options: ScanOptions, quiet: bool) -> Result<ScanSummary, DigfootError> {
    let email = EmailAddress::parse(email)?;

    let file_config = match &options.config {
        Some(path) => Some(config::parse_config(&PathBuf::from(path)).await?),
        None => None,
    };
    let settings = build_scan_settings(
        email.clone(),
        &options,
        file_config.as_ref(),
        |name| std::env::var(name).ok(),
    )?;

    println!("{}", search_banner(&email));

    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping sources");
            ctrlc_token.cancel();
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<ScanEvent>();
    let progress_task = tokio::spawn(async move {
        let mut progress = ScanProgress::new(quiet);
        while let Some(event) = rx.recv().await {
            progress.handle_event(&event);
        }
    });

    let orchestrator = ScanOrchestrator::new(settings)
        .with_cancel_token(cancel_token)
        .with_event_channel(tx);
    let result = orchestrator.run().await;
    drop(orchestrator);
    let _ = progress_task.await;

    let summary = result?;
    for line in summary_lines(&summary.counts, &summary.report_path) {
        println!("{}", line);
    }
    if let Some(path) = &summary.markdown_path {
        info!(path = %path.display(), "Markdown report written");
    }
    Ok(summary)
}

/// Resolve scan settings: CLI flags > environment > config file > defaults.
pub fn build_scan_settings(
    email: EmailAddress,
    options: &ScanOptions,
    file_config: Option<&DigfootConfig>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ScanSettings, DigfootError> {
    let scan = file_config.and_then(|c| c.scan.clone()).unwrap_or_default();
    let output = file_config.and_then(|c| c.output.clone()).unwrap_or_default();
    let mut sources = file_config.and_then(|c| c.sources.clone()).unwrap_or_default();

    if let Some(ids) = &options.sources {
        sources.enabled = Some(normalize_ids(ids));
    }
    if let Some(ids) = &options.exclude {
        sources.disabled.get_or_insert_with(Vec::new).extend(normalize_ids(ids));
    }
    apply_env_keys(&mut sources, &env);
    config::validate_conflicts(&DigfootConfig {
        scan: None,
        sources: Some(sources.clone()),
        output: None,
    })?;

    let window = parse_window(
        options.since.as_deref().or(scan.since.as_deref()),
        options.until.as_deref().or(scan.until.as_deref()),
        Utc::now(),
    )?;

    let mut settings = ScanSettings::new(email);

    if let Some(n) = options.concurrency.or(scan.max_concurrency) {
        if n == 0 {
            return Err(DigfootError::Config("Concurrency must be at least 1".into()));
        }
        settings.max_concurrency = n;
    }
    if let Some(secs) = options.timeout.or(scan.source_timeout_secs) {
        if secs == 0 {
            return Err(DigfootError::Config("Source timeout must be at least 1 second".into()));
        }
        settings.source_timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = scan.max_retries {
        settings.retry = RetryConfig { max_retries: retries };
    }
    settings.max_variations = options
        .max_variations
        .or(scan.max_variations)
        .unwrap_or(DEFAULT_MAX_VARIATIONS);
    settings.max_results = scan.max_results.unwrap_or(DEFAULT_MAX_RESULTS).max(1);

    if let Some(agent) = scan.user_agent {
        settings.http.user_agent = agent;
    }
    if let Some(secs) = scan.request_timeout_secs {
        settings.http.request_timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(ms) = scan.request_delay_ms {
        settings.http.request_delay = Duration::from_millis(ms);
    }

    settings.window = window;
    settings.sources = sources;
    settings.output_dir = PathBuf::from(
        options.output.clone().or(output.directory).unwrap_or_else(|| ".".to_string()),
    );
    settings.markdown = options.markdown || output.markdown.unwrap_or(false);
    settings.check_domain = !options.no_domain && scan.check_domain.unwrap_or(true);

    Ok(settings)
}

fn normalize_ids(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim().to_lowercase())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Credentials from the environment override the config file.
fn apply_env_keys(sources: &mut SourcesConfig, env: &impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = lookup("GITHUB_TOKEN") {
        sources.github.get_or_insert_with(ApiSourceConfig::default).api_key = Some(token);
    }
    if let Some(key) = lookup("HIBP_API_KEY") {
        sources.breaches.get_or_insert_with(ApiSourceConfig::default).api_key = Some(key);
    }
    if let Some(key) = lookup("STACKEXCHANGE_KEY") {
        sources.stackexchange.get_or_insert_with(StackExchangeConfig::default).api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config_str;

    fn email() -> EmailAddress {
        EmailAddress::parse("example@domain.com").unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let settings = build_scan_settings(email(), &ScanOptions::default(), None, no_env).unwrap();
        assert_eq!(settings.max_concurrency, 8);
        assert_eq!(settings.source_timeout, Duration::from_secs(60));
        assert_eq!(settings.max_variations, 3);
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert!(settings.check_domain);
        assert!(!settings.markdown);
        assert!(settings.window.is_unbounded());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse_config_str(
            "scan:\n  max_concurrency: 2\n  since: 2020-01-01\noutput:\n  directory: reports\n  markdown: true",
        )
        .unwrap();
        let options = ScanOptions {
            concurrency: Some(4),
            since: Some("2023-01-01".to_string()),
            no_domain: true,
            ..Default::default()
        };
        let settings = build_scan_settings(email(), &options, Some(&file), no_env).unwrap();
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(settings.window.since.unwrap().format("%Y").to_string(), "2023");
        assert_eq!(settings.output_dir, PathBuf::from("reports"));
        assert!(settings.markdown);
        assert!(!settings.check_domain);
    }

    #[test]
    fn test_env_overrides_file_keys() {
        let file = parse_config_str("sources:\n  github:\n    api_key: from-file").unwrap();
        let env = |name: &str| match name {
            "GITHUB_TOKEN" => Some("from-env".to_string()),
            "HIBP_API_KEY" => Some("  ".to_string()),
            _ => None,
        };
        let settings = build_scan_settings(email(), &ScanOptions::default(), Some(&file), env).unwrap();
        assert_eq!(settings.sources.github.unwrap().api_key.as_deref(), Some("from-env"));
        assert!(settings.sources.breaches.is_none());
    }

    #[test]
    fn test_source_filters_validated() {
        let options = ScanOptions {
            sources: Some(vec!["GitHub".to_string(), " reddit".to_string()]),
            exclude: Some(vec!["reddit".to_string()]),
            ..Default::default()
        };
        let err = build_scan_settings(email(), &options, None, no_env).unwrap_err();
        assert!(matches!(err, DigfootError::Config(msg) if msg.contains("reddit")));

        let options = ScanOptions { sources: Some(vec!["myspace".to_string()]), ..Default::default() };
        assert!(build_scan_settings(email(), &options, None, no_env).is_err());
    }

    #[test]
    fn test_zero_concurrency_and_inverted_window_rejected() {
        let options = ScanOptions { concurrency: Some(0), ..Default::default() };
        assert!(build_scan_settings(email(), &options, None, no_env).is_err());

        let options = ScanOptions {
            since: Some("2024-06-01".to_string()),
            until: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(build_scan_settings(email(), &options, None, no_env).is_err());
    }
}
