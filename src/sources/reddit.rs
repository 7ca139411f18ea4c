use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use urlencoding::encode;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use crate::utils::text::from_unix;
use crate::utils::truncate_snippet;
use super::adapter::{merge_partial, SourceAdapter, Target};
use super::http::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
const PLATFORM: &str = "reddit";

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    selftext: Option<String>,
    permalink: String,
    created_utc: Option<f64>,
    author: Option<String>,
    subreddit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Comment {
    body: Option<String>,
    permalink: String,
    created_utc: Option<f64>,
    link_title: Option<String>,
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    name: String,
    created_utc: Option<f64>,
    #[serde(default)]
    is_suspended: bool,
}

/// Reddit's public JSON listings: posts quoting the address, plus accounts
/// and comment history for each username variation.
pub struct RedditSource {
    http: Arc<HttpClient>,
    base_url: String,
}

impl RedditSource {
    pub fn new(http: Arc<HttpClient>, base_url: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        }
    }

    async fn search_posts(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let url = format!(
            "{}/search.json?q={}&sort=new&limit={}",
            self.base_url,
            encode(&format!("\"{}\"", email)),
            target.max_results
        );
        let listing: Option<Listing<Post>> = self.http.get_json(&url, &[]).await?;
        Ok(children(listing)
            .map(|post| {
                let title = post.title.map(|t| match &post.subreddit {
                    Some(sub) => format!("r/{}: {}", sub, t),
                    None => t,
                });
                Finding::new(PLATFORM, FindingType::ForumPost, email)
                    .at(post.created_utc.and_then(unix_f64))
                    .url(format!("{}{}", self.base_url, post.permalink))
                    .title(title)
                    .snippet(post.selftext.as_deref().map(truncate_snippet))
                    .author(post.author)
            })
            .collect())
    }

    async fn search_user(&self, target: &Target, username: &str) -> Result<Vec<Finding>, DigfootError> {
        let about_url = format!("{}/user/{}/about.json", self.base_url, encode(username));
        let account: Option<Thing<Account>> = self.http.get_json(&about_url, &[]).await?;
        let Some(Thing { data: account }) = account else {
            return Ok(Vec::new());
        };
        if account.is_suspended {
            return Ok(Vec::new());
        }

        let mut findings = vec![
            Finding::new(PLATFORM, FindingType::ProfileMention, username)
                .at(account.created_utc.and_then(unix_f64))
                .url(format!("{}/user/{}", self.base_url, account.name))
                .author(Some(account.name.clone())),
        ];

        let comments_url = format!(
            "{}/user/{}/comments.json?limit={}",
            self.base_url,
            encode(&account.name),
            target.max_results
        );
        // A confirmed account stands even if its history can't be fetched.
        let listing: Option<Listing<Comment>> = match self.http.get_json(&comments_url, &[]).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(source = PLATFORM, username, error = %e, "Comment history unavailable");
                None
            }
        };
        findings.extend(children(listing).map(|comment| {
            Finding::new(PLATFORM, FindingType::Comment, username)
                .at(comment.created_utc.and_then(unix_f64))
                .url(format!("{}{}", self.base_url, comment.permalink))
                .title(comment.link_title)
                .snippet(comment.body.as_deref().map(truncate_snippet))
                .author(comment.author)
        }));

        Ok(findings)
    }
}

fn children<T>(listing: Option<Listing<T>>) -> impl Iterator<Item = T> {
    listing
        .map(|l| l.data.children)
        .unwrap_or_default()
        .into_iter()
        .map(|thing| thing.data)
}

fn unix_f64(secs: f64) -> Option<chrono::DateTime<chrono::Utc>> {
    from_unix(secs as i64)
}

#[async_trait]
impl SourceAdapter for RedditSource {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let mut results = vec![self.search_posts(target).await];
        for username in &target.usernames {
            results.push(self.search_user(target, username).await);
        }
        merge_partial(PLATFORM, results)
    }

    fn name(&self) -> &str { PLATFORM }
    fn source_id(&self) -> &'static str { "reddit" }
}
