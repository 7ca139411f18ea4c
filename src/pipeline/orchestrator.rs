use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::errors::DigfootError;
use crate::models::{ActivityReport, DomainInfo, FindingCounts, Identifiers, ScanStatus};
use crate::reporting::writer::{write_json_report, write_markdown_report};
use crate::sources::domain::probe_domain;
use crate::sources::{build_sources, HttpClient, SourceAdapter, Target};
use super::aggregator::{Aggregator, AggregatorSettings};
use super::events::ScanEvent;
use super::state::{ScanSettings, ScanSummary};
use tracing::{error, info, warn};

/// Runs one scan end to end: sources, domain probe, report files.
pub struct ScanOrchestrator {
    settings: ScanSettings,
    cancel_token: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<ScanEvent>>,
    adapters: Option<Vec<Arc<dyn SourceAdapter>>>,
}

impl ScanOrchestrator {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            cancel_token: CancellationToken::new(),
            event_tx: None,
            adapters: None,
        }
    }

    /// Share an external token so Ctrl-C handlers can stop the scan.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Use these adapters instead of building them from the source config.
    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        self.adapters = Some(adapters);
        self
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Run the scan. Once the output directory exists, any error still
    /// leaves a `failed` report behind before it is returned.
    pub async fn run(&self) -> Result<ScanSummary, DigfootError> {
        let started = Instant::now();
        let scan_date = Utc::now();
        let settings = &self.settings;

        tokio::fs::create_dir_all(&settings.output_dir).await?;

        let target = Arc::new(Target::new(
            settings.email.clone(),
            settings.max_variations,
            settings.max_results,
        ));

        match self.execute(target.clone(), started, scan_date).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!(scan_id = %settings.scan_id, error = %e, "Scan failed");
                let report = ActivityReport {
                    email: settings.email.clone(),
                    scan_id: settings.scan_id.clone(),
                    scan_date,
                    completed_at: Some(Utc::now()),
                    status: ScanStatus::Failed,
                    identifiers: Identifiers {
                        base_username: target.base_username.clone(),
                        variations: target.usernames.clone(),
                    },
                    window: settings.window.clone(),
                    summary: FindingCounts::default(),
                    sources: Vec::new(),
                    domain_info: None,
                    findings: Vec::new(),
                };
                if let Err(write_err) = write_json_report(&report, &settings.output_dir).await {
                    warn!(error = %write_err, "Could not save failed-scan report");
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        target: Arc<Target>,
        started: Instant,
        scan_date: chrono::DateTime<Utc>,
    ) -> Result<ScanSummary, DigfootError> {
        let settings = &self.settings;

        let http = Arc::new(HttpClient::new(&settings.http)?);
        let (adapters, skipped) = match &self.adapters {
            Some(adapters) => (adapters.clone(), Vec::new()),
            None => {
                let set = build_sources(&settings.sources, http.clone());
                (set.adapters, set.skipped)
            }
        };

        info!(
            scan_id = %settings.scan_id,
            email = %settings.email,
            sources = adapters.len(),
            usernames = ?target.usernames,
            "Scan started"
        );
        self.emit(ScanEvent::ScanStarted {
            scan_id: settings.scan_id.clone(),
            email: settings.email.to_string(),
            sources: adapters.len(),
        });

        let mut aggregator = Aggregator::new(
            adapters,
            AggregatorSettings {
                max_concurrency: settings.max_concurrency,
                source_timeout: settings.source_timeout,
                retry: settings.retry.clone(),
                window: settings.window.clone(),
            },
        )
        .with_cancel_token(self.cancel_token.clone());
        if let Some(ref tx) = self.event_tx {
            aggregator = aggregator.with_event_channel(tx.clone());
        }

        let (result, domain_info) = tokio::join!(
            aggregator.run(target.clone()),
            self.check_domain(&http),
        );

        let mut sources = result.outcomes;
        sources.extend(skipped);
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        let status = if result.interrupted {
            ScanStatus::Interrupted
        } else {
            ScanStatus::Completed
        };
        let report = ActivityReport {
            email: settings.email.clone(),
            scan_id: settings.scan_id.clone(),
            scan_date,
            completed_at: Some(Utc::now()),
            status,
            identifiers: Identifiers {
                base_username: target.base_username.clone(),
                variations: target.usernames.clone(),
            },
            window: settings.window.clone(),
            summary: FindingCounts::from_findings(&result.findings),
            sources,
            domain_info,
            findings: result.findings,
        };

        let report_path = write_json_report(&report, &settings.output_dir).await?;
        let markdown_path = if settings.markdown {
            Some(write_markdown_report(&report, &settings.output_dir).await?)
        } else {
            None
        };

        let total_duration_ms = started.elapsed().as_millis() as u64;
        let mut summary = ScanSummary::from_report(&report, report_path, total_duration_ms);
        summary.markdown_path = markdown_path;

        if summary.interrupted() {
            warn!(findings = report.summary.total, "Scan interrupted, partial report saved");
            self.emit(ScanEvent::ScanInterrupted { total_findings: report.summary.total });
        } else {
            info!(
                findings = report.summary.total,
                failed_sources = summary.failed_sources,
                duration_ms = total_duration_ms,
                path = %summary.report_path.display(),
                "Scan completed"
            );
            self.emit(ScanEvent::ScanCompleted {
                total_findings: report.summary.total,
                total_duration_ms,
            });
        }

        Ok(summary)
    }

    async fn check_domain(&self, http: &HttpClient) -> Option<DomainInfo> {
        if !self.settings.check_domain {
            return None;
        }
        let domain = self.settings.email.domain();
        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => None,
            info = probe_domain(http, domain) => Some(info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::identity::EmailAddress;
    use crate::models::{Finding, FindingType};

    struct Canned;

    #[async_trait]
    impl SourceAdapter for Canned {
        async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
            Ok(vec![
                Finding::new("hackernews", FindingType::Comment, target.email.as_str())
                    .url("https://news.ycombinator.com/item?id=1"),
                Finding::new("reddit", FindingType::ProfileMention, &target.base_username)
                    .url("https://www.reddit.com/user/example"),
            ])
        }
        fn name(&self) -> &str { "canned" }
        fn source_id(&self) -> &'static str { "test" }
    }

    fn settings(dir: &std::path::Path) -> ScanSettings {
        let mut settings = ScanSettings::new(EmailAddress::parse("example@domain.com").unwrap());
        settings.output_dir = dir.to_path_buf();
        settings.check_domain = false;
        settings
    }

    #[tokio::test]
    async fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let summary = ScanOrchestrator::new(settings(dir.path()))
            .with_adapters(vec![Arc::new(Canned)])
            .run()
            .await
            .unwrap();

        assert_eq!(summary.status, ScanStatus::Completed);
        assert_eq!(summary.counts.comments, 1);
        assert_eq!(summary.counts.profile_mentions, 1);
        assert_eq!(summary.report_path, dir.path().join("example_activity.json"));

        let raw = std::fs::read_to_string(&summary.report_path).unwrap();
        let report: ActivityReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(report.email.as_str(), "example@domain.com");
        assert_eq!(report.sources.len(), 1);
        assert!(report.domain_info.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_is_interrupted() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let mut s = settings(dir.path());
        s.markdown = true;

        let summary = ScanOrchestrator::new(s)
            .with_cancel_token(token)
            .with_adapters(vec![Arc::new(Canned)])
            .run()
            .await
            .unwrap();

        assert!(summary.interrupted());
        assert_eq!(summary.counts.total, 0);
        assert!(summary.report_path.exists());
        assert!(summary.markdown_path.unwrap().exists());
    }

    #[tokio::test]
    async fn test_setup_error_leaves_failed_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path());
        s.http.user_agent = "broken\nagent".to_string();

        let result = ScanOrchestrator::new(s)
            .with_adapters(vec![Arc::new(Canned)])
            .run()
            .await;
        assert!(result.is_err());

        let raw = std::fs::read_to_string(dir.path().join("example_activity.json")).unwrap();
        let report: ActivityReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(report.status, ScanStatus::Failed);
        assert!(report.findings.is_empty());
        assert_eq!(report.identifiers.base_username, "example");
        assert!(raw.contains("\"status\": \"failed\""));
    }
}
