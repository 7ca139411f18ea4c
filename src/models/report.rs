use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::identity::EmailAddress;
use super::finding::{Finding, FindingType};
use super::source::{DomainInfo, SourceOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Interrupted,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifiers {
    pub base_username: String,
    pub variations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Inclusive on both ends; undated activity is always inside.
    pub fn contains(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        let Some(ts) = timestamp else { return true };
        self.since.map_or(true, |s| ts >= s) && self.until.map_or(true, |u| ts <= u)
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }
}

/// Per-type counts of the findings in a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingCounts {
    pub comments: usize,
    pub forum_posts: usize,
    pub profile_mentions: usize,
    pub commits: usize,
    pub breaches: usize,
    pub web_mentions: usize,
    pub total: usize,
}

impl FindingCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.finding_type {
                FindingType::Comment => counts.comments += 1,
                FindingType::ForumPost => counts.forum_posts += 1,
                FindingType::ProfileMention => counts.profile_mentions += 1,
                FindingType::Commit => counts.commits += 1,
                FindingType::Breach => counts.breaches += 1,
                FindingType::WebMention => counts.web_mentions += 1,
            }
        }
        counts.total = findings.len();
        counts
    }
}

/// The document written to `<local-part>_activity.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    pub email: EmailAddress,
    pub scan_id: String,
    pub scan_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ScanStatus,
    pub identifiers: Identifiers,
    pub window: TimeWindow,
    pub summary: FindingCounts,
    pub sources: Vec<SourceOutcome>,
    pub domain_info: Option<DomainInfo>,
    pub findings: Vec<Finding>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_by_type() {
        let mut findings = Vec::new();
        for _ in 0..2 {
            findings.push(Finding::new("reddit", FindingType::Comment, "x"));
        }
        findings.push(Finding::new("hackernews", FindingType::ForumPost, "x"));
        findings.push(Finding::new("hibp", FindingType::Breach, "x"));
        let counts = FindingCounts::from_findings(&findings);
        assert_eq!(counts.comments, 2);
        assert_eq!(counts.forum_posts, 1);
        assert_eq!(counts.profile_mentions, 0);
        assert_eq!(counts.breaches, 1);
        assert_eq!(counts.total, 4);
    }

    #[test]
    fn test_window_is_inclusive_and_keeps_undated() {
        let window = TimeWindow { since: Some(ts(2024, 1, 1)), until: Some(ts(2024, 12, 31)) };
        assert!(window.contains(Some(ts(2024, 1, 1))));
        assert!(window.contains(Some(ts(2024, 12, 31))));
        assert!(!window.contains(Some(ts(2023, 12, 31))));
        assert!(!window.contains(Some(ts(2025, 1, 1))));
        assert!(window.contains(None));
    }

    #[test]
    fn test_open_ended_window() {
        let window = TimeWindow { since: Some(ts(2024, 6, 1)), until: None };
        assert!(window.contains(Some(ts(2030, 1, 1))));
        assert!(!window.contains(Some(ts(2024, 5, 31))));
        assert!(TimeWindow::default().is_unbounded());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ScanStatus::Interrupted).unwrap(), "\"interrupted\"");
    }
}
