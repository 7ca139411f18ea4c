use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use scraper::{Html, Selector};
use urlencoding::encode;
use crate::config::SearchEngine;
use crate::errors::DigfootError;
use crate::models::{Finding, FindingType};
use crate::utils::text::collapse_whitespace;
use super::adapter::{merge_partial, SourceAdapter, Target};
use super::http::{host_of, HttpClient};

/// Links kept per query.
const LINKS_PER_QUERY: usize = 3;

/// Scrapes a search engine's HTML results for pages mentioning the identity.
pub struct WebSearchSource {
    http: Arc<HttpClient>,
    engine: SearchEngine,
    name: String,
}

impl WebSearchSource {
    pub fn new(http: Arc<HttpClient>, engine: SearchEngine) -> Self {
        let name = format!("web_search:{}", engine.name.to_lowercase());
        Self { http, engine, name }
    }

    async fn run_query(&self, query: &str, identifier: &str) -> Result<Vec<Finding>, DigfootError> {
        let url = self.engine.url_template.replace("{query}", &encode(query));
        let page = self.http.get_page(&url).await?;
        if !page.is_ok() {
            return Err(DigfootError::Http { status: page.status, url });
        }
        Ok(extract_links(&page.body, &self.engine.exclude_hosts)
            .into_iter()
            .take(LINKS_PER_QUERY)
            .map(|(href, text)| {
                Finding::new(&self.engine.name, FindingType::WebMention, identifier)
                    .url(href)
                    .title(Some(text))
                    .snippet(Some(format!("Result for {}", query)))
            })
            .collect())
    }
}

/// Queries issued per engine, paired with the identifier each one targets.
pub fn build_queries(target: &Target) -> Vec<(String, String)> {
    let email = target.email.as_str();
    let mut queries = vec![(format!("\"{}\"", email), email.to_string())];
    if !target.base_username.is_empty() {
        queries.push((format!("\"{}\"", target.base_username), target.base_username.clone()));
    }
    for site in ["github.com", "twitter.com", "pastebin.com"] {
        queries.push((format!("site:{} \"{}\"", site, email), email.to_string()));
    }
    queries
}

/// Absolute outbound result links with their anchor text, in page order.
///
/// Links back to the engine itself are dropped, except redirect links that
/// carry the real target in a `uddg` (DuckDuckGo) or `u` (Bing) parameter.
pub fn extract_links(html: &str, exclude_hosts: &[String]) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(raw) = anchor.value().attr("href") else { continue };
        let href = if raw.starts_with("//") { format!("https:{}", raw) } else { raw.to_string() };
        if !href.starts_with("http://") && !href.starts_with("https://") {
            continue;
        }

        let target = if is_excluded(&href, exclude_hosts) {
            match redirect_target(&href) {
                Some(t) if !is_excluded(&t, exclude_hosts) => t,
                _ => continue,
            }
        } else {
            href
        };

        if seen.insert(target.clone()) {
            let text = collapse_whitespace(&anchor.text().collect::<String>());
            links.push((target, text));
        }
    }
    links
}

fn is_excluded(href: &str, exclude_hosts: &[String]) -> bool {
    let Some(host) = host_of(href) else { return true };
    exclude_hosts.iter().any(|ex| {
        let ex = ex.to_lowercase();
        host == ex || host.ends_with(&format!(".{}", ex))
    })
}

fn redirect_target(href: &str) -> Option<String> {
    let parsed = url::Url::parse(href).ok()?;
    parsed
        .query_pairs()
        .filter(|(k, _)| k == "uddg" || k == "u")
        .find_map(|(_, v)| decode_redirect(&v))
}

/// Bing wraps the target as `a1` + unpadded base64url.
fn decode_redirect(value: &str) -> Option<String> {
    let target = match value.strip_prefix("a1") {
        Some(encoded) => {
            let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => value.to_string(),
    };
    (target.starts_with("http://") || target.starts_with("https://")).then_some(target)
}

#[async_trait]
impl SourceAdapter for WebSearchSource {
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError> {
        let mut results = Vec::new();
        for (query, identifier) in build_queries(target) {
            results.push(self.run_query(&query, &identifier).await);
        }
        merge_partial(&self.name, results)
    }

    fn name(&self) -> &str { &self.name }
    fn source_id(&self) -> &'static str { "web_search" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::EmailAddress;

    #[test]
    fn test_queries_cover_email_username_and_sites() {
        let target = Target::new(EmailAddress::parse("example@domain.com").unwrap(), 3, 10);
        let queries = build_queries(&target);
        assert_eq!(queries.len(), 5);
        assert_eq!(queries[0].0, "\"example@domain.com\"");
        assert_eq!(queries[1], ("\"example\"".to_string(), "example".to_string()));
        assert_eq!(queries[4].0, "site:pastebin.com \"example@domain.com\"");
    }

    #[test]
    fn test_extract_links_skips_engine_and_relative_links() {
        let html = r#"<html><body>
            <a href="/settings">Settings</a>
            <a href="https://www.bing.com/images">Images</a>
            <a href="https://pastebin.com/abc"> Leak   dump </a>
            <a href="https://pastebin.com/abc">duplicate</a>
            <a href="mailto:x@y.com">mail</a>
            <a href="https://forum.example.org/t/42">Thread</a>
        </body></html>"#;
        let links = extract_links(html, &["bing.com".to_string()]);
        assert_eq!(links, vec![
            ("https://pastebin.com/abc".to_string(), "Leak dump".to_string()),
            ("https://forum.example.org/t/42".to_string(), "Thread".to_string()),
        ]);
    }

    #[test]
    fn test_extract_links_decodes_duckduckgo_redirects() {
        let html = r#"<a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fgithub.com%2Fexample&amp;rut=abc">example (Ex)</a>
                      <a href="https://duckduckgo.com/feedback">Feedback</a>"#;
        let links = extract_links(html, &["duckduckgo.com".to_string()]);
        assert_eq!(links, vec![("https://github.com/example".to_string(), "example (Ex)".to_string())]);
    }

    #[test]
    fn test_extract_links_decodes_bing_redirects() {
        let html = r#"<h2><a href="https://www.bing.com/ck/a?!&amp;&amp;p=abc&amp;u=a1aHR0cHM6Ly9naXRodWIuY29tL2V4YW1wbGU&amp;ntb=1">example - GitHub</a></h2>
                      <a href="https://www.bing.com/ck/a?!&amp;&amp;p=def&amp;u=a1bm90LWEtdXJs&amp;ntb=1">junk</a>"#;
        let links = extract_links(html, &["bing.com".to_string()]);
        assert_eq!(links, vec![("https://github.com/example".to_string(), "example - GitHub".to_string())]);
    }
}
