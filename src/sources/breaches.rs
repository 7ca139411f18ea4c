use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use urlencoding::encode;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use crate::utils::text::{from_date, strip_html};
use crate::utils::truncate_snippet;
use super::adapter::{SourceAdapter, Target};
use super::http::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://haveibeenpwned.com/api/v3";
const PLATFORM: &str = "haveibeenpwned";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Breach {
    name: String,
    title: Option<String>,
    domain: Option<String>,
    breach_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    data_classes: Vec<String>,
}

/// Have I Been Pwned breached-account lookup. Needs an API key.
pub struct BreachSource {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl BreachSource {
    pub fn new(http: Arc<HttpClient>, base_url: Option<&str>, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

fn breach_finding(email: &str, breach: Breach) -> Finding {
    let mut snippet = String::new();
    if !breach.data_classes.is_empty() {
        snippet.push_str(&format!("Exposed: {}.", breach.data_classes.join(", ")));
    }
    if let Some(description) = &breach.description {
        if !snippet.is_empty() {
            snippet.push(' ');
        }
        snippet.push_str(&strip_html(description));
    }

    Finding::new(PLATFORM, FindingType::Breach, email)
        .at(breach.breach_date.as_deref().and_then(from_date))
        .url(format!("https://haveibeenpwned.com/PwnedWebsites#{}", breach.name))
        .title(breach.title.or(Some(breach.name)))
        .snippet(Some(truncate_snippet(&snippet)))
        .author(breach.domain)
}

#[async_trait]
impl SourceAdapter for BreachSource {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let url = format!(
            "{}/breachedaccount/{}?truncateResponse=false",
            self.base_url,
            encode(email)
        );
        let headers = [("hibp-api-key", self.api_key.clone())];
        let breaches: Option<Vec<Breach>> = self.http.get_json(&url, &headers).await?;
        Ok(breaches
            .unwrap_or_default()
            .into_iter()
            .map(|b| breach_finding(email, b))
            .collect())
    }

    fn name(&self) -> &str { "breaches" }
    fn source_id(&self) -> &'static str { "breaches" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breach_finding_from_api_record() {
        let breach: Breach = serde_json::from_str(r#"{
            "Name": "Adobe", "Title": "Adobe", "Domain": "adobe.com",
            "BreachDate": "2013-10-04",
            "Description": "In October 2013, <a href=\"x\">153 million</a> accounts were breached.",
            "DataClasses": ["Email addresses", "Passwords"]
        }"#).unwrap();
        let finding = breach_finding("example@domain.com", breach);
        assert_eq!(finding.finding_type, FindingType::Breach);
        assert_eq!(finding.timestamp.unwrap().to_rfc3339(), "2013-10-04T00:00:00+00:00");
        let snippet = finding.evidence.snippet.unwrap();
        assert!(snippet.starts_with("Exposed: Email addresses, Passwords."));
        assert!(snippet.contains("153 million accounts"));
        assert_eq!(finding.evidence.url.as_deref(), Some("https://haveibeenpwned.com/PwnedWebsites#Adobe"));
    }
}
