use async_trait::async_trait;
use crate::errors::DigfootError;
use crate::identity::EmailAddress;
use crate::models::Finding;
use tracing::warn;

/// What a scan is looking for.
#[derive(Debug, Clone)]
pub struct Target {
    pub email: EmailAddress,
    pub base_username: String,
    /// Username variations to probe, most likely first.
    pub usernames: Vec<String>,
    /// Upper bound on results requested per query.
    pub max_results: usize,
}

impl Target {
    pub fn new(email: EmailAddress, max_variations: usize, max_results: usize) -> Self {
        let base_username = email.base_username();
        let usernames = crate::identity::generate_variations(&base_username)
            .into_iter()
            .take(max_variations)
            .collect();
        Self { email, base_username, usernames, max_results }
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Query the platform for activity linked to the target.
    async fn search(&self, target: &Target) -> Result<Vec<Finding>, DigfootError>;

    /// Unique adapter name, used in outcomes and logs
    fn name(&self) -> &str;

    /// Source id used by enable/disable filters
    fn source_id(&self) -> &'static str;
}

/// Merge the results of an adapter's independent sub-queries.
///
/// Partial failures are logged and dropped; the adapter fails only when
/// every sub-query failed.
pub fn merge_partial(
    source: &str,
    results: Vec<Result<Vec<Finding>, DigfootError>>,
) -> Result<Vec<Finding>, DigfootError> {
    let mut findings = Vec::new();
    let mut first_error = None;
    let mut any_ok = results.is_empty();

    for result in results {
        match result {
            Ok(batch) => {
                any_ok = true;
                findings.extend(batch);
            }
            Err(e) => {
                warn!(source, error = %e, "Sub-query failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if !any_ok => Err(e),
        _ => Ok(findings),
    }
}
