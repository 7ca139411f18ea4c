use std::sync::Arc;

use crate::config::{default_profile_sites, default_search_engines, SourcesConfig};
use crate::models::SourceOutcome;
use super::adapter::SourceAdapter;
use super::breaches::BreachSource;
use super::github::GitHubSource;
use super::hackernews::HackerNewsSource;
use super::http::HttpClient;
use super::profiles::ProfileProbe;
use super::reddit::RedditSource;
use super::stackexchange::StackExchangeSource;
use super::web_search::WebSearchSource;
use tracing::{debug, warn};

/// Every source id accepted by enable/disable filters.
pub const SOURCE_IDS: &[&str] = &[
    "github",
    "reddit",
    "hackernews",
    "stackexchange",
    "profiles",
    "breaches",
    "web_search",
];

/// Adapters ready to run, plus sources that could not be configured.
pub struct SourceSet {
    pub adapters: Vec<Arc<dyn SourceAdapter>>,
    pub skipped: Vec<SourceOutcome>,
}

fn is_selected(config: &SourcesConfig, id: &str) -> bool {
    let enabled = config.enabled.as_ref().map_or(true, |ids| ids.iter().any(|e| e == id));
    let disabled = config.disabled.as_ref().map_or(false, |ids| ids.iter().any(|d| d == id));
    enabled && !disabled
}

/// Build the adapters selected by `config`, all sharing one HTTP client.
pub fn build_sources(config: &SourcesConfig, http: Arc<HttpClient>) -> SourceSet {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    let mut skipped = Vec::new();

    if is_selected(config, "github") {
        let c = config.github.clone().unwrap_or_default();
        adapters.push(Arc::new(GitHubSource::new(
            http.clone(),
            c.base_url.as_deref(),
            c.api_key.as_deref(),
        )));
    }

    if is_selected(config, "reddit") {
        let c = config.reddit.clone().unwrap_or_default();
        adapters.push(Arc::new(RedditSource::new(http.clone(), c.base_url.as_deref())));
    }

    if is_selected(config, "hackernews") {
        let c = config.hackernews.clone().unwrap_or_default();
        adapters.push(Arc::new(HackerNewsSource::new(http.clone(), c.base_url.as_deref())));
    }

    if is_selected(config, "stackexchange") {
        let c = config.stackexchange.clone().unwrap_or_default();
        adapters.push(Arc::new(StackExchangeSource::new(
            http.clone(),
            c.base_url.as_deref(),
            c.site.as_deref(),
            c.api_key.as_deref(),
        )));
    }

    if is_selected(config, "breaches") {
        let c = config.breaches.clone().unwrap_or_default();
        match c.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => adapters.push(Arc::new(BreachSource::new(http.clone(), c.base_url.as_deref(), key))),
            None => {
                warn!("Breach lookup skipped: no API key (set HIBP_API_KEY)");
                skipped.push(SourceOutcome::skipped("breaches", "no API key configured (HIBP_API_KEY)"));
            }
        }
    }

    if is_selected(config, "profiles") {
        let sites = config.profiles.clone().unwrap_or_else(default_profile_sites);
        for site in sites {
            adapters.push(Arc::new(ProfileProbe::new(http.clone(), site)));
        }
    }

    if is_selected(config, "web_search") {
        let engines = config.search_engines.clone().unwrap_or_else(default_search_engines);
        for engine in engines {
            adapters.push(Arc::new(WebSearchSource::new(http.clone(), engine)));
        }
    }

    debug!(
        adapters = adapters.len(),
        skipped = skipped.len(),
        "Sources configured"
    );
    SourceSet { adapters, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiSourceConfig;

    fn http() -> Arc<HttpClient> {
        Arc::new(HttpClient::new(&Default::default()).unwrap())
    }

    fn names(set: &SourceSet) -> Vec<String> {
        set.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    #[test]
    fn test_defaults_register_everything_but_keyless_breaches() {
        let set = build_sources(&SourcesConfig::default(), http());
        let names = names(&set);
        assert!(names.contains(&"github".to_string()));
        assert!(names.contains(&"profiles:linkedin".to_string()));
        assert!(names.contains(&"web_search:duckduckgo".to_string()));
        assert_eq!(set.adapters.len(), 4 + 5 + 2);
        assert_eq!(set.skipped.len(), 1);
        assert_eq!(set.skipped[0].name, "breaches");
    }

    #[test]
    fn test_enabled_filter_and_key() {
        let config = SourcesConfig {
            enabled: Some(vec!["breaches".to_string(), "hackernews".to_string()]),
            breaches: Some(ApiSourceConfig { base_url: None, api_key: Some("k".to_string()) }),
            ..Default::default()
        };
        let set = build_sources(&config, http());
        assert_eq!(names(&set), vec!["hackernews", "breaches"]);
        assert!(set.skipped.is_empty());
    }

    #[test]
    fn test_disabled_filter() {
        let config = SourcesConfig {
            disabled: Some(vec!["profiles".to_string(), "web_search".to_string(), "breaches".to_string()]),
            ..Default::default()
        };
        let set = build_sources(&config, http());
        assert_eq!(names(&set), vec!["github", "reddit", "hackernews", "stackexchange"]);
        assert!(set.skipped.is_empty());
    }
}
