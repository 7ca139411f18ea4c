use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use urlencoding::encode;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use crate::utils::text::{from_unix, strip_html};
use crate::utils::truncate_snippet;
use super::adapter::{merge_partial, SourceAdapter, Target};
use super::http::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://hn.algolia.com/api/v1";
const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";
const USER_URL: &str = "https://news.ycombinator.com/user?id=";
const PLATFORM: &str = "hackernews";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default = "Vec::new")]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    story_title: Option<String>,
    comment_text: Option<String>,
    story_text: Option<String>,
    author: Option<String>,
    created_at_i: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HnUser {
    username: String,
    created_at_i: Option<i64>,
    about: Option<String>,
}

/// Hacker News via the Algolia search API.
pub struct HackerNewsSource {
    http: Arc<HttpClient>,
    base_url: String,
}

impl HackerNewsSource {
    pub fn new(http: Arc<HttpClient>, base_url: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        }
    }

    async fn search_tag(&self, target: &Target, tag: &str) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let url = format!(
            "{}/search?query={}&tags={}&hitsPerPage={}",
            self.base_url,
            encode(&format!("\"{}\"", email)),
            tag,
            target.max_results
        );
        let response: Option<SearchResponse> = self.http.get_json(&url, &[]).await?;
        let finding_type = if tag == "comment" { FindingType::Comment } else { FindingType::ForumPost };

        Ok(response.map(|r| r.hits).unwrap_or_default()
            .into_iter()
            .map(|hit| {
                let body = hit.comment_text.or(hit.story_text);
                Finding::new(PLATFORM, finding_type, email)
                    .at(hit.created_at_i.and_then(from_unix))
                    .url(format!("{}{}", ITEM_URL, hit.object_id))
                    .title(hit.title.or(hit.story_title))
                    .snippet(body.map(|b| truncate_snippet(&strip_html(&b))))
                    .author(hit.author)
            })
            .collect())
    }

    async fn lookup_user(&self, username: &str) -> Result<Vec<Finding>, DigfootError> {
        let url = format!("{}/users/{}", self.base_url, encode(username));
        let user: Option<HnUser> = self.http.get_json(&url, &[]).await?;
        Ok(user
            .map(|u| {
                Finding::new(PLATFORM, FindingType::ProfileMention, username)
                    .at(u.created_at_i.and_then(from_unix))
                    .url(format!("{}{}", USER_URL, u.username))
                    .snippet(u.about.map(|a| truncate_snippet(&strip_html(&a))))
                    .author(Some(u.username))
            })
            .into_iter()
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsSource {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let (comments, stories) = tokio::join!(
            self.search_tag(target, "comment"),
            self.search_tag(target, "story"),
        );
        let mut results = vec![comments, stories];
        for username in &target.usernames {
            results.push(self.lookup_user(username).await);
        }
        merge_partial(PLATFORM, results)
    }

    fn name(&self) -> &str { PLATFORM }
    fn source_id(&self) -> &'static str { "hackernews" }
}
