use std::path::Path;
use crate::errors::DigfootError;
use crate::pipeline::window::parse_window;
use crate::sources::registry::SOURCE_IDS;
use super::types::DigfootConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<DigfootConfig, DigfootError> {
    if !path.exists() {
        return Err(DigfootError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(DigfootError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<DigfootConfig, DigfootError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(DigfootConfig::default());
    }

    validate_security_patterns(&yaml)?;
    validate_schema(&yaml)?;

    let config: DigfootConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), DigfootError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| DigfootError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| DigfootError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory: typed deserialization below is the hard gate.
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
pub fn validate_conflicts(config: &DigfootConfig) -> Result<(), DigfootError> {
    if let Some(sources) = &config.sources {
        for id in sources.enabled.iter().chain(sources.disabled.iter()).flatten() {
            if !SOURCE_IDS.contains(&id.as_str()) {
                return Err(DigfootError::Config(format!(
                    "Unknown source '{}' (known: {})",
                    id,
                    SOURCE_IDS.join(", ")
                )));
            }
        }

        if let (Some(enabled), Some(disabled)) = (&sources.enabled, &sources.disabled) {
            if let Some(both) = enabled.iter().find(|id| disabled.contains(id)) {
                return Err(DigfootError::Config(format!(
                    "Conflicting sources: '{}' appears in both enabled and disabled lists",
                    both
                )));
            }
        }

        for site in sources.profiles.iter().flatten() {
            if !site.url_template.contains("{username}") {
                return Err(DigfootError::Config(format!(
                    "Profile site '{}' url_template lacks a {{username}} placeholder",
                    site.name
                )));
            }
            check_http_url(&site.name, &site.url_template)?;
        }

        for engine in sources.search_engines.iter().flatten() {
            if !engine.url_template.contains("{query}") {
                return Err(DigfootError::Config(format!(
                    "Search engine '{}' url_template lacks a {{query}} placeholder",
                    engine.name
                )));
            }
            check_http_url(&engine.name, &engine.url_template)?;
        }

        let base_urls = [
            ("github", sources.github.as_ref().and_then(|c| c.base_url.as_ref())),
            ("reddit", sources.reddit.as_ref().and_then(|c| c.base_url.as_ref())),
            ("hackernews", sources.hackernews.as_ref().and_then(|c| c.base_url.as_ref())),
            ("breaches", sources.breaches.as_ref().and_then(|c| c.base_url.as_ref())),
            ("stackexchange", sources.stackexchange.as_ref().and_then(|c| c.base_url.as_ref())),
        ];
        for (name, url) in base_urls {
            if let Some(url) = url {
                check_http_url(name, url)?;
            }
        }
    }

    if let Some(scan) = &config.scan {
        parse_window(scan.since.as_deref(), scan.until.as_deref(), chrono::Utc::now())?;
        if scan.max_concurrency == Some(0) {
            return Err(DigfootError::Config("scan.max_concurrency must be at least 1".into()));
        }
    }

    Ok(())
}

fn check_http_url(name: &str, url: &str) -> Result<(), DigfootError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(DigfootError::Config(format!("Source '{}' URL must be http(s): {}", name, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config_str("").unwrap();
        assert!(config.scan.is_none());
    }

    #[test]
    fn test_enabled_and_disabled_overlap_rejected() {
        let err = parse_config_str("sources:\n  enabled: [github, reddit]\n  disabled: [reddit]").unwrap_err();
        assert!(matches!(err, DigfootError::Config(msg) if msg.contains("reddit")));
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(parse_config_str("sources:\n  enabled: [myspace]").is_err());
    }

    #[test]
    fn test_profile_template_requires_placeholder() {
        let yaml = "sources:\n  profiles:\n    - name: mastodon\n      url_template: https://mastodon.social/";
        assert!(parse_config_str(yaml).is_err());
    }

    #[test]
    fn test_search_engine_requires_http() {
        let yaml = "sources:\n  search_engines:\n    - name: odd\n      url_template: ftp://search/{query}";
        assert!(parse_config_str(yaml).is_err());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let yaml = "scan:\n  since: 2024-06-01\n  until: 2024-01-01";
        assert!(parse_config_str(yaml).is_err());
    }

    #[test]
    fn test_valid_config_parses() {
        let yaml = r#"
scan:
  max_concurrency: 2
  since: 2024-01-01
sources:
  enabled: [hackernews, profiles]
  profiles:
    - name: mastodon
      url_template: https://mastodon.social/@{username}
  hackernews:
    base_url: http://127.0.0.1:9000
"#;
        let config = parse_config_str(yaml).unwrap();
        let sources = config.sources.unwrap();
        assert_eq!(sources.profiles.unwrap()[0].name, "mastodon");
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = parse_config(Path::new("/nonexistent/digfoot.yaml")).await.unwrap_err();
        assert!(matches!(err, DigfootError::Config(_)));
    }
}
