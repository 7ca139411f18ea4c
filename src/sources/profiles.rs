use std::sync::Arc;

use async_trait::async_trait;
use urlencoding::encode;
use crate::config::ProfileSite;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use super::adapter::{SourceAdapter, Target};
use super::http::{HttpClient, Page};
use tracing::debug;

/// Probes `<site>/<username>` for each username variation; the first page
/// that looks like a real profile wins.
pub struct ProfileProbe {
    http: Arc<HttpClient>,
    site: ProfileSite,
    name: String,
}

impl ProfileProbe {
    pub fn new(http: Arc<HttpClient>, site: ProfileSite) -> Self {
        let name = format!("profiles:{}", site.name.to_lowercase());
        Self { http, site, name }
    }

    pub fn profile_url(&self, username: &str) -> String {
        self.site.url_template.replace("{username}", &encode(username))
    }
}

/// A page is a profile when it loaded and carries none of the site's
/// not-found markers.
pub fn looks_like_profile(page: &Page, not_found_markers: &[String]) -> bool {
    if !page.is_ok() {
        return false;
    }
    let body = page.body.to_lowercase();
    !not_found_markers.iter().any(|m| body.contains(&m.to_lowercase()))
}

#[async_trait]
impl SourceAdapter for ProfileProbe {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let mut last_error = None;
        let mut any_fetched = false;

        for username in &target.usernames {
            let url = self.profile_url(username);
            match self.http.get_page(&url).await {
                Ok(page) => {
                    any_fetched = true;
                    if looks_like_profile(&page, &self.site.not_found_markers) {
                        return Ok(vec![
                            Finding::new(&self.site.name, FindingType::ProfileMention, username)
                                .url(url)
                                .author(Some(username.clone())),
                        ]);
                    }
                    debug!(site = %self.site.name, username = %username, status = page.status, "No profile");
                }
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) if !any_fetched => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str { &self.name }
    fn source_id(&self) -> &'static str { "profiles" }
}
