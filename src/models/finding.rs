use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of evidence a finding represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    Comment,
    ForumPost,
    ProfileMention,
    /// Commit authored with the address on a code-hosting site
    Commit,
    /// Record in a breach registry
    Breach,
    /// Link surfaced by a web search engine
    WebMention,
}

impl FindingType {
    pub const ALL: [FindingType; 6] = [
        FindingType::Comment,
        FindingType::ForumPost,
        FindingType::ProfileMention,
        FindingType::Commit,
        FindingType::Breach,
        FindingType::WebMention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::ForumPost => "forum_post",
            Self::ProfileMention => "profile_mention",
            Self::Commit => "commit",
            Self::Breach => "breach",
            Self::WebMention => "web_mention",
        }
    }
}

impl std::fmt::Display for FindingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload backing a finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Plain-text excerpt, HTML stripped and truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A single piece of activity linked to the scanned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Lowercase platform id, e.g. "github" or "hackernews".
    pub source_platform: String,
    pub finding_type: FindingType,
    /// When the underlying activity happened, if the platform exposes it.
    pub timestamp: Option<DateTime<Utc>>,
    /// When the finding was collected.
    pub observed_at: DateTime<Utc>,
    /// Identifiers (email or username variations) that matched.
    pub identifiers: Vec<String>,
    pub evidence: Evidence,
}

impl Finding {
    pub fn new(source_platform: &str, finding_type: FindingType, identifier: &str) -> Self {
        Self {
            source_platform: source_platform.to_lowercase(),
            finding_type,
            timestamp: None,
            observed_at: Utc::now(),
            identifiers: vec![identifier.to_string()],
            evidence: Evidence::default(),
        }
    }

    pub fn at(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.evidence.url = Some(url.into());
        self
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.evidence.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn snippet(mut self, snippet: Option<String>) -> Self {
        self.evidence.snippet = snippet.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.evidence.author = author.filter(|a| !a.is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_type_serializes_snake_case() {
        let json = serde_json::to_string(&FindingType::ForumPost).unwrap();
        assert_eq!(json, "\"forum_post\"");
        let parsed: FindingType = serde_json::from_str("\"profile_mention\"").unwrap();
        assert_eq!(parsed, FindingType::ProfileMention);
    }

    #[test]
    fn test_display_matches_serde_name() {
        for ty in FindingType::ALL {
            assert_eq!(serde_json::to_string(&ty).unwrap(), format!("\"{}\"", ty));
        }
    }

    #[test]
    fn test_builder_lowercases_platform_and_drops_blank_fields() {
        let finding = Finding::new("GitHub", FindingType::Comment, "example")
            .url("https://github.com/a/b/issues/1")
            .title(Some("   ".to_string()))
            .author(Some("octocat".to_string()));
        assert_eq!(finding.source_platform, "github");
        assert_eq!(finding.identifiers, vec!["example"]);
        assert!(finding.evidence.title.is_none());
        assert_eq!(finding.evidence.author.as_deref(), Some("octocat"));
    }

    #[test]
    fn test_empty_evidence_fields_are_omitted() {
        let finding = Finding::new("reddit", FindingType::ProfileMention, "example");
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["evidence"], serde_json::json!({}));
        assert!(value["timestamp"].is_null());
    }
}
