use crate::models::{FindingType, SourceStatus};

/// Messages sent from a running scan to the progress display.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Fan-out is about to begin
    ScanStarted {
        scan_id: String,
        email: String,
        sources: usize,
    },
    /// A source acquired a concurrency slot and is querying
    SourceStarted {
        name: String,
    },
    /// A source returned (possibly with zero findings)
    SourceCompleted {
        name: String,
        findings: usize,
        duration_ms: u64,
    },
    /// A source failed, timed out or was cancelled
    SourceFailed {
        name: String,
        status: SourceStatus,
        error: String,
    },
    /// A finding survived windowing and dedup
    FindingDiscovered {
        platform: String,
        finding_type: FindingType,
    },
    ScanCompleted {
        total_findings: usize,
        total_duration_ms: u64,
    },
    /// Ctrl-C arrived; a partial report follows
    ScanInterrupted {
        total_findings: usize,
    },
}
