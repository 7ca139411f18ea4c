use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use urlencoding::encode;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use crate::utils::text::from_rfc3339;
use crate::utils::truncate_snippet;
use super::adapter::{merge_partial, SourceAdapter, Target};
use super::http::HttpClient;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PLATFORM: &str = "github";

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    html_url: String,
    title: Option<String>,
    body: Option<String>,
    created_at: Option<String>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    html_url: String,
    commit: CommitDetail,
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
}

/// GitHub REST search: issues mentioning the address, commits authored with
/// it, and accounts that publish it.
pub struct GitHubSource {
    http: Arc<HttpClient>,
    base_url: String,
    token: Option<String>,
}

impl GitHubSource {
    pub fn new(http: Arc<HttpClient>, base_url: Option<&str>, token: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Accept", "application/vnd.github+json".to_string()),
            ("X-GitHub-Api-Version", "2022-11-28".to_string()),
        ];
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        headers
    }

    async fn search_issues(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let url = format!(
            "{}/search/issues?q={}&sort=created&per_page={}",
            self.base_url,
            encode(&format!("\"{}\"", email)),
            target.max_results
        );
        let page: Option<SearchPage<Issue>> = self.http.get_json(&url, &self.headers()).await?;
        Ok(page.map(|p| p.items).unwrap_or_default()
            .into_iter()
            .map(|issue| {
                Finding::new(PLATFORM, FindingType::ForumPost, email)
                    .at(issue.created_at.as_deref().and_then(from_rfc3339))
                    .url(issue.html_url)
                    .title(issue.title)
                    .snippet(issue.body.as_deref().map(truncate_snippet))
                    .author(issue.user.map(|u| u.login))
            })
            .collect())
    }

    async fn search_commits(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let url = format!(
            "{}/search/commits?q={}&sort=author-date&per_page={}",
            self.base_url,
            encode(&format!("author-email:{}", email)),
            target.max_results
        );
        let page: Option<SearchPage<CommitItem>> = self.http.get_json(&url, &self.headers()).await?;
        Ok(page.map(|p| p.items).unwrap_or_default()
            .into_iter()
            .map(|item| {
                let summary = item.commit.message.lines().next().unwrap_or_default().to_string();
                let author = item.commit.author;
                Finding::new(PLATFORM, FindingType::Commit, email)
                    .at(author.as_ref().and_then(|a| a.date.as_deref()).and_then(from_rfc3339))
                    .url(item.html_url)
                    .title(item.repository.map(|r| r.full_name))
                    .snippet(Some(truncate_snippet(&summary)))
                    .author(author.and_then(|a| a.name))
            })
            .collect())
    }

    async fn search_users(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let email = target.email.as_str();
        let url = format!(
            "{}/search/users?q={}&per_page={}",
            self.base_url,
            encode(&format!("{} in:email", email)),
            target.max_results
        );
        let page: Option<SearchPage<User>> = self.http.get_json(&url, &self.headers()).await?;
        Ok(page.map(|p| p.items).unwrap_or_default()
            .into_iter()
            .map(|user| {
                let profile = user.html_url.unwrap_or_else(|| format!("https://github.com/{}", user.login));
                Finding::new(PLATFORM, FindingType::ProfileMention, email)
                    .url(profile)
                    .author(Some(user.login))
            })
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for GitHubSource {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let (issues, commits, users) = tokio::join!(
            self.search_issues(target),
            self.search_commits(target),
            self.search_users(target),
        );
        merge_partial(PLATFORM, vec![issues, commits, users])
    }

    fn name(&self) -> &str { PLATFORM }
    fn source_id(&self) -> &'static str { "github" }
}
