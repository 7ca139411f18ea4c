use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "scan": {
                "type": "object",
                "properties": {
                    "max_concurrency": { "type": "integer", "minimum": 1 },
                    "source_timeout_secs": { "type": "integer", "minimum": 1 },
                    "request_timeout_secs": { "type": "integer", "minimum": 1 },
                    "request_delay_ms": { "type": "integer", "minimum": 0 },
                    "max_retries": { "type": "integer", "minimum": 0 },
                    "max_variations": { "type": "integer", "minimum": 1 },
                    "max_results": { "type": "integer", "minimum": 1 },
                    "user_agent": { "type": "string" },
                    "since": { "type": "string" },
                    "until": { "type": "string" },
                    "check_domain": { "type": "boolean" }
                }
            },
            "sources": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "array", "items": { "type": "string" } },
                    "disabled": { "type": "array", "items": { "type": "string" } },
                    "github": { "$ref": "#/$defs/api_source" },
                    "reddit": { "$ref": "#/$defs/api_source" },
                    "hackernews": { "$ref": "#/$defs/api_source" },
                    "breaches": { "$ref": "#/$defs/api_source" },
                    "stackexchange": {
                        "type": "object",
                        "properties": {
                            "base_url": { "type": "string", "format": "uri" },
                            "api_key": { "type": "string" },
                            "site": { "type": "string" }
                        }
                    },
                    "profiles": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["name", "url_template"],
                            "properties": {
                                "name": { "type": "string" },
                                "url_template": { "type": "string" },
                                "not_found_markers": { "type": "array", "items": { "type": "string" } }
                            }
                        }
                    },
                    "search_engines": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["name", "url_template"],
                            "properties": {
                                "name": { "type": "string" },
                                "url_template": { "type": "string" },
                                "exclude_hosts": { "type": "array", "items": { "type": "string" } }
                            }
                        }
                    }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" },
                    "markdown": { "type": "boolean" }
                }
            }
        },
        "$defs": {
            "api_source": {
                "type": "object",
                "properties": {
                    "base_url": { "type": "string", "format": "uri" },
                    "api_key": { "type": "string" }
                }
            }
        }
    })
});
