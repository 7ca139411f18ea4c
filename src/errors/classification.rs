use super::types::DigfootError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl DigfootError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Retryable errors
            DigfootError::RateLimit(_) => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            DigfootError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            DigfootError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            DigfootError::Http { status, .. } => ErrorClassification {
                error_type: "HttpError",
                retryable: *status >= 500,
            },

            // Non-retryable errors
            DigfootError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                retryable: false,
            },
            DigfootError::Permission(_) => ErrorClassification {
                error_type: "PermissionError",
                retryable: false,
            },
            DigfootError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            DigfootError::InvalidEmail(_) => ErrorClassification {
                error_type: "InvalidEmailError",
                retryable: false,
            },
            DigfootError::UnexpectedResponse(_) => ErrorClassification {
                error_type: "UnexpectedResponseError",
                retryable: false,
            },
            DigfootError::Cancelled(_) => ErrorClassification {
                error_type: "CancelledError",
                retryable: false,
            },
            DigfootError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            DigfootError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },

            DigfootError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },
            DigfootError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = DigfootError::RateLimit("too many requests".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_auth_error_not_retryable() {
        let err = DigfootError::Authentication("bad key".into());
        let class = err.classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "AuthenticationError");
    }

    #[test]
    fn test_config_error_not_retryable() {
        let err = DigfootError::Config("invalid config".into());
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_network_error_retryable() {
        let err = DigfootError::Network("connection refused".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_timeout_retryable() {
        let err = DigfootError::Timeout("timed out".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_server_error_retryable_client_error_not() {
        let server = DigfootError::Http { status: 503, url: "https://x".into() };
        let client = DigfootError::Http { status: 400, url: "https://x".into() };
        assert!(server.classify().retryable);
        assert!(!client.classify().retryable);
    }

    #[test]
    fn test_unexpected_response_not_retryable() {
        let err = DigfootError::UnexpectedResponse("missing field".into());
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_cancelled_not_retryable() {
        let err = DigfootError::Cancelled("ctrl-c".into());
        assert!(!err.classify().retryable);
    }
}
