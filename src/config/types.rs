use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DigfootConfig {
    pub scan: Option<ScanConfig>,
    pub sources: Option<SourcesConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanConfig {
    pub max_concurrency: Option<usize>,
    pub source_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub request_delay_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub max_variations: Option<usize>,
    pub max_results: Option<usize>,
    pub user_agent: Option<String>,
    /// RFC 3339, `YYYY-MM-DD` or a relative age such as `30d`.
    pub since: Option<String>,
    pub until: Option<String>,
    pub check_domain: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SourcesConfig {
    /// Restrict the scan to these source ids.
    pub enabled: Option<Vec<String>>,
    pub disabled: Option<Vec<String>>,
    pub github: Option<ApiSourceConfig>,
    pub reddit: Option<ApiSourceConfig>,
    pub hackernews: Option<ApiSourceConfig>,
    pub stackexchange: Option<StackExchangeConfig>,
    pub breaches: Option<ApiSourceConfig>,
    pub profiles: Option<Vec<ProfileSite>>,
    pub search_engines: Option<Vec<SearchEngine>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ApiSourceConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StackExchangeConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub site: Option<String>,
}

/// A site probed for `<url_template with {username}>` existence.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProfileSite {
    pub name: String,
    pub url_template: String,
    #[serde(default = "default_not_found_markers")]
    pub not_found_markers: Vec<String>,
}

/// A web search engine scraped for links mentioning the identity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SearchEngine {
    pub name: String,
    /// Must contain `{query}`.
    pub url_template: String,
    /// Hosts whose links are the engine's own navigation.
    #[serde(default)]
    pub exclude_hosts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub directory: Option<String>,
    pub markdown: Option<bool>,
}

pub fn default_not_found_markers() -> Vec<String> {
    vec!["not found".to_string(), "404".to_string()]
}

pub fn default_profile_sites() -> Vec<ProfileSite> {
    [
        ("twitter", "https://twitter.com/{username}"),
        ("github", "https://github.com/{username}"),
        ("reddit", "https://www.reddit.com/user/{username}"),
        ("instagram", "https://instagram.com/{username}"),
        ("linkedin", "https://linkedin.com/in/{username}"),
    ]
    .into_iter()
    .map(|(name, template)| ProfileSite {
        name: name.to_string(),
        url_template: template.to_string(),
        not_found_markers: default_not_found_markers(),
    })
    .collect()
}

pub fn default_search_engines() -> Vec<SearchEngine> {
    vec![
        SearchEngine {
            name: "duckduckgo".to_string(),
            url_template: "https://html.duckduckgo.com/html/?q={query}".to_string(),
            exclude_hosts: vec!["duckduckgo.com".to_string()],
        },
        SearchEngine {
            name: "bing".to_string(),
            url_template: "https://www.bing.com/search?q={query}".to_string(),
            exclude_hosts: vec![
                "bing.com".to_string(),
                "microsoft.com".to_string(),
                "msn.com".to_string(),
            ],
        },
    ]
}
