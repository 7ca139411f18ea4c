use std::path::PathBuf;
use std::time::Duration;
use crate::errors::RetryConfig;
use crate::identity::EmailAddress;
use crate::models::{ActivityReport, FindingCounts, ScanStatus, TimeWindow};
use crate::sources::HttpSettings;
use crate::config::SourcesConfig;

/// Fully resolved settings for one scan (CLI > env > file > defaults).
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub scan_id: String,
    pub email: EmailAddress,
    pub output_dir: PathBuf,
    pub max_concurrency: usize,
    pub source_timeout: Duration,
    pub retry: RetryConfig,
    pub max_variations: usize,
    pub max_results: usize,
    pub window: TimeWindow,
    pub http: HttpSettings,
    pub sources: SourcesConfig,
    pub check_domain: bool,
    pub markdown: bool,
}

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_VARIATIONS: usize = 3;
pub const DEFAULT_MAX_RESULTS: usize = 20;

impl ScanSettings {
    pub fn new(email: EmailAddress) -> Self {
        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            email,
            output_dir: PathBuf::from("."),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            retry: RetryConfig::default(),
            max_variations: DEFAULT_MAX_VARIATIONS,
            max_results: DEFAULT_MAX_RESULTS,
            window: TimeWindow::default(),
            http: HttpSettings::default(),
            sources: SourcesConfig::default(),
            check_domain: true,
            markdown: false,
        }
    }
}

/// What a finished (or interrupted) scan hands back to the CLI.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub status: ScanStatus,
    pub counts: FindingCounts,
    pub report_path: PathBuf,
    pub markdown_path: Option<PathBuf>,
    pub failed_sources: usize,
    pub total_duration_ms: u64,
}

impl ScanSummary {
    pub fn from_report(report: &ActivityReport, report_path: PathBuf, total_duration_ms: u64) -> Self {
        use crate::models::SourceStatus;
        Self {
            status: report.status,
            counts: report.summary.clone(),
            report_path,
            markdown_path: None,
            failed_sources: report
                .sources
                .iter()
                .filter(|s| matches!(s.status, SourceStatus::Failed | SourceStatus::TimedOut))
                .count(),
            total_duration_ms,
        }
    }

    pub fn interrupted(&self) -> bool {
        self.status == ScanStatus::Interrupted
    }
}
