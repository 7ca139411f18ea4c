use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Failed,
    TimedOut,
    Skipped,
    Cancelled,
}

/// How a single source fared during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub name: String,
    pub status: SourceStatus,
    /// Raw finding count, before windowing and dedup.
    pub findings: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn skipped(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            status: SourceStatus::Skipped,
            findings: 0,
            duration_ms: 0,
            error: Some(reason.to_string()),
        }
    }
}

/// Result of probing the email's domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    pub domain: String,
    pub website_accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}
