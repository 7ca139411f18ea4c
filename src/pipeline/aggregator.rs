use std::sync::Arc;
use std::time::{Duration, Instant};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use crate::errors::{with_retry, RetryConfig};
use crate::models::{Finding, SourceOutcome, SourceStatus, TimeWindow};
use crate::sources::{SourceAdapter, Target};
use crate::utils::truncate_error;
use super::dedup::{deduplicate_findings, sort_findings};
use super::events::ScanEvent;
use super::state::{DEFAULT_MAX_CONCURRENCY, DEFAULT_SOURCE_TIMEOUT_SECS};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub max_concurrency: usize,
    /// Upper bound on one source's total time, retries included.
    pub source_timeout: Duration,
    pub retry: RetryConfig,
    pub window: TimeWindow,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            retry: RetryConfig::default(),
            window: TimeWindow::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregateResult {
    /// Windowed, deduplicated and sorted.
    pub findings: Vec<Finding>,
    /// One per adapter, sorted by name.
    pub outcomes: Vec<SourceOutcome>,
    pub interrupted: bool,
}

/// Fans a target out to every adapter and folds the answers together.
pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    settings: AggregatorSettings,
    cancel_token: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<ScanEvent>>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, settings: AggregatorSettings) -> Self {
        Self {
            adapters,
            settings,
            cancel_token: CancellationToken::new(),
            event_tx: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit(&self, event: ScanEvent) {
        emit(&self.event_tx, event);
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    pub async fn run(&self, target: Arc<Target>) -> AggregateResult {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut pending = FuturesUnordered::new();

        for adapter in &self.adapters {
            let job = SourceJob {
                adapter: adapter.clone(),
                target: target.clone(),
                semaphore: semaphore.clone(),
                cancel: self.cancel_token.clone(),
                retry: self.settings.retry.clone(),
                timeout: self.settings.source_timeout,
                event_tx: self.event_tx.clone(),
            };
            pending.push(job.run());
        }

        let mut outcomes = Vec::with_capacity(self.adapters.len());
        let mut collected = Vec::new();
        while let Some((outcome, findings)) = pending.next().await {
            collected.extend(findings);
            outcomes.push(outcome);
        }
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));

        let raw = collected.len();
        let window = &self.settings.window;
        collected.retain(|f| window.contains(f.timestamp));
        let windowed = collected.len();
        let mut findings = deduplicate_findings(collected);
        sort_findings(&mut findings);
        debug!(raw, windowed, unique = findings.len(), "Findings aggregated");

        for f in &findings {
            self.emit(ScanEvent::FindingDiscovered {
                platform: f.source_platform.clone(),
                finding_type: f.finding_type,
            });
        }

        AggregateResult {
            findings,
            outcomes,
            interrupted: self.cancel_token.is_cancelled(),
        }
    }
}

fn emit(tx: &Option<mpsc::UnboundedSender<ScanEvent>>, event: ScanEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}

struct SourceJob {
    adapter: Arc<dyn SourceAdapter>,
    target: Arc<Target>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    retry: RetryConfig,
    timeout: Duration,
    event_tx: Option<mpsc::UnboundedSender<ScanEvent>>,
}

enum JobEnd {
    Done(Result<Vec<Finding>, crate::errors::DigfootError>),
    TimedOut,
    Cancelled,
}

impl SourceJob {
    async fn run(self) -> (SourceOutcome, Vec<Finding>) {
        let name = self.adapter.name().to_string();

        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return (self.finish(&name, JobEnd::Cancelled, 0), Vec::new());
            }
            permit = self.semaphore.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => return (self.finish(&name, JobEnd::Cancelled, 0), Vec::new()),
            },
        };

        emit(&self.event_tx, ScanEvent::SourceStarted { name: name.clone() });
        debug!(source = %name, source_id = self.adapter.source_id(), "Source started");
        let started = Instant::now();

        let adapter: &dyn SourceAdapter = self.adapter.as_ref();
        let target: &Target = &self.target;
        let work = with_retry(&name, &self.retry, move || adapter.search(target));

        let end = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => JobEnd::Cancelled,
            result = tokio::time::timeout(self.timeout, work) => match result {
                Ok(done) => JobEnd::Done(done),
                Err(_) => JobEnd::TimedOut,
            },
        };

        let elapsed = started.elapsed().as_millis() as u64;
        match end {
            JobEnd::Done(Ok(findings)) => {
                let outcome = SourceOutcome {
                    name: name.clone(),
                    status: SourceStatus::Ok,
                    findings: findings.len(),
                    duration_ms: elapsed,
                    error: None,
                };
                info!(source = %name, findings = findings.len(), duration_ms = elapsed, "Source completed");
                emit(&self.event_tx, ScanEvent::SourceCompleted {
                    name,
                    findings: findings.len(),
                    duration_ms: elapsed,
                });
                (outcome, findings)
            }
            other => (self.finish(&name, other, elapsed), Vec::new()),
        }
    }

    /// Outcome for a source that produced nothing.
    fn finish(&self, name: &str, end: JobEnd, duration_ms: u64) -> SourceOutcome {
        let (status, error) = match end {
            JobEnd::Done(Ok(_)) => (SourceStatus::Ok, None),
            JobEnd::Done(Err(e)) => (SourceStatus::Failed, Some(truncate_error(&e.to_string()))),
            JobEnd::TimedOut => (
                SourceStatus::TimedOut,
                Some(format!("timed out after {}s", self.timeout.as_secs_f64())),
            ),
            JobEnd::Cancelled => (SourceStatus::Cancelled, Some("cancelled".to_string())),
        };

        if let Some(ref message) = error {
            if status == SourceStatus::Cancelled {
                debug!(source = %name, "Source cancelled");
            } else {
                warn!(source = %name, status = ?status, error = %message, "Source did not complete");
            }
            emit(&self.event_tx, ScanEvent::SourceFailed {
                name: name.to_string(),
                status,
                error: message.clone(),
            });
        }

        SourceOutcome {
            name: name.to_string(),
            status,
            findings: 0,
            duration_ms,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use crate::errors::DigfootError;
    use crate::identity::EmailAddress;
    use crate::models::FindingType;

    struct Fixed {
        name: &'static str,
        findings: Vec<Finding>,
    }

    #[async_trait]
    impl SourceAdapter for Fixed {
        async fn search(&self, _target: &Target) -> Result<Vec<Finding>, DigfootError> {
            Ok(self.findings.clone())
        }
        fn name(&self) -> &str { self.name }
        fn source_id(&self) -> &'static str { "test" }
    }

    struct Broken;

    #[async_trait]
    impl SourceAdapter for Broken {
        async fn search(&self, _target: &Target) -> Result<Vec<Finding>, DigfootError> {
            Err(DigfootError::Authentication("bad credentials".into()))
        }
        fn name(&self) -> &str { "broken" }
        fn source_id(&self) -> &'static str { "test" }
    }

    struct Slow;

    #[async_trait]
    impl SourceAdapter for Slow {
        async fn search(&self, _target: &Target) -> Result<Vec<Finding>, DigfootError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
        fn name(&self) -> &str { "slow" }
        fn source_id(&self) -> &'static str { "test" }
    }

    fn target() -> Arc<Target> {
        Arc::new(Target::new(EmailAddress::parse("example@domain.com").unwrap(), 3, 10))
    }

    fn settings() -> AggregatorSettings {
        AggregatorSettings {
            source_timeout: Duration::from_millis(200),
            retry: RetryConfig { max_retries: 0 },
            ..Default::default()
        }
    }

    fn comment(url: &str) -> Finding {
        Finding::new("reddit", FindingType::Comment, "example").url(url)
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(Broken),
            Arc::new(Slow),
            Arc::new(Fixed { name: "fixed", findings: vec![comment("https://r.test/1")] }),
        ];
        let result = Aggregator::new(adapters, settings()).run(target()).await;

        assert_eq!(result.findings.len(), 1);
        let statuses: Vec<_> = result.outcomes.iter().map(|o| (o.name.as_str(), o.status)).collect();
        assert_eq!(statuses, vec![
            ("broken", SourceStatus::Failed),
            ("fixed", SourceStatus::Ok),
            ("slow", SourceStatus::TimedOut),
        ]);
        assert!(result.outcomes[0].error.as_deref().unwrap().contains("bad credentials"));
        assert!(!result.interrupted);
    }

    #[tokio::test]
    async fn test_window_dedup_and_order_applied() {
        let old = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(Fixed {
                name: "a",
                findings: vec![
                    comment("https://r.test/old").at(Some(old)),
                    comment("https://r.test/undated"),
                    comment("https://r.test/new").at(Some(recent)),
                ],
            }),
            Arc::new(Fixed { name: "b", findings: vec![comment("https://r.test/new")] }),
        ];
        let mut s = settings();
        s.window.since = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());

        let result = Aggregator::new(adapters, s).run(target()).await;
        let urls: Vec<_> = result.findings.iter().map(|f| f.evidence.url.clone().unwrap()).collect();
        assert_eq!(urls, vec!["https://r.test/new", "https://r.test/undated"]);
        assert_eq!(result.outcomes[0].findings, 3);
    }

    #[tokio::test]
    async fn test_cancellation_marks_sources_cancelled() {
        let token = CancellationToken::new();
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(Slow)];
        let mut s = settings();
        s.source_timeout = Duration::from_secs(60);
        let aggregator = Aggregator::new(adapters, s).with_cancel_token(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });
        let result = aggregator.run(target()).await;
        canceller.await.unwrap();

        assert!(result.interrupted);
        assert_eq!(result.outcomes[0].status, SourceStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_events_stream_source_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(Fixed { name: "fixed", findings: vec![comment("https://r.test/1")] }),
            Arc::new(Broken),
        ];
        Aggregator::new(adapters, settings())
            .with_event_channel(tx)
            .run(target())
            .await;

        let mut started = 0;
        let mut completed = 0;
        let mut failed = 0;
        let mut discovered = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                ScanEvent::SourceStarted { .. } => started += 1,
                ScanEvent::SourceCompleted { .. } => completed += 1,
                ScanEvent::SourceFailed { .. } => failed += 1,
                ScanEvent::FindingDiscovered { .. } => discovered += 1,
                _ => {}
            }
        }
        assert_eq!((started, completed, failed, discovered), (2, 1, 1, 1));
    }
}
