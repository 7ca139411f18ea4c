use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use urlencoding::encode;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use crate::utils::text::{from_unix, strip_html};
use crate::utils::truncate_snippet;
use super::adapter::{SourceAdapter, Target};
use super::http::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.3";
pub const DEFAULT_SITE: &str = "stackoverflow";

/// Sites served from their own `.com` domain rather than `<site>.stackexchange.com`.
const STANDALONE_SITES: &[&str] = &["stackoverflow", "superuser", "serverfault", "askubuntu", "stackapps"];

#[derive(Debug, Deserialize)]
struct ExcerptResponse {
    #[serde(default = "Vec::new")]
    items: Vec<Excerpt>,
    error_id: Option<u32>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Excerpt {
    item_type: String,
    title: Option<String>,
    excerpt: Option<String>,
    creation_date: Option<i64>,
    question_id: Option<u64>,
    answer_id: Option<u64>,
}

/// Stack Exchange full-text excerpt search on a single site.
pub struct StackExchangeSource {
    http: Arc<HttpClient>,
    base_url: String,
    site: String,
    key: Option<String>,
}

impl StackExchangeSource {
    pub fn new(http: Arc<HttpClient>, base_url: Option<&str>, site: Option<&str>, key: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            site: site.unwrap_or(DEFAULT_SITE).to_string(),
            key: key.map(str::to_string),
        }
    }

    fn site_host(&self) -> String {
        site_host(&self.site)
    }
}

pub fn site_host(site: &str) -> String {
    if site.contains('.') {
        site.to_string()
    } else if STANDALONE_SITES.contains(&site) {
        format!("{}.com", site)
    } else if site == "mathoverflow" {
        "mathoverflow.net".to_string()
    } else {
        format!("{}.stackexchange.com", site)
    }
}

#[async_trait]
impl SourceAdapter for StackExchangeSource {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let mut url = format!(
            "{}/search/excerpts?order=desc&sort=creation&q={}&site={}&pagesize={}",
            self.base_url,
            encode(&format!("\"{}\"", email)),
            encode(&self.site),
            target.max_results
        );
        if let Some(key) = &self.key {
            url.push_str(&format!("&key={}", encode(key)));
        }

        let Some(response) = self.http.get_json::<ExcerptResponse>(&url, &[]).await? else {
            return Ok(Vec::new());
        };
        if let Some(id) = response.error_id {
            return Err(DigfootError::UnexpectedResponse(format!(
                "Stack Exchange error {}: {}",
                id,
                response.error_message.unwrap_or_default()
            )));
        }

        let host = self.site_host();
        let platform = self.site.clone();
        Ok(response.items
            .into_iter()
            .filter_map(|item| {
                let (finding_type, link) = match (item.item_type.as_str(), item.answer_id, item.question_id) {
                    ("answer", Some(answer), _) => (FindingType::Comment, format!("https://{}/a/{}", host, answer)),
                    ("question", _, Some(question)) => (FindingType::ForumPost, format!("https://{}/q/{}", host, question)),
                    _ => return None,
                };
                Some(
                    Finding::new(&platform, finding_type, email)
                        .at(item.creation_date.and_then(from_unix))
                        .url(link)
                        .title(item.title.map(|t| strip_html(&t)))
                        .snippet(item.excerpt.map(|e| truncate_snippet(&strip_html(&e)))),
                )
            })
            .collect())
    }

    fn name(&self) -> &str { "stackexchange" }
    fn source_id(&self) -> &'static str { "stackexchange" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_host_mapping() {
        assert_eq!(site_host("stackoverflow"), "stackoverflow.com");
        assert_eq!(site_host("unix"), "unix.stackexchange.com");
        assert_eq!(site_host("mathoverflow"), "mathoverflow.net");
        assert_eq!(site_host("ru.stackoverflow.com"), "ru.stackoverflow.com");
    }

    #[test]
    fn test_error_payload_deserializes() {
        let response: ExcerptResponse = serde_json::from_str(
            r#"{"error_id":502,"error_message":"too many requests from this IP","error_name":"throttle_violation"}"#,
        ).unwrap();
        assert_eq!(response.error_id, Some(502));
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_excerpt_items_deserialize() {
        let response: ExcerptResponse = serde_json::from_str(r#"{"items":[
            {"item_type":"question","question_id":11,"title":"How to &amp; why","creation_date":1500000000},
            {"item_type":"answer","question_id":11,"answer_id":22,"excerpt":"contact <span class=\"highlight\">example</span>"}
        ],"has_more":false}"#).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[1].answer_id, Some(22));
    }
}
