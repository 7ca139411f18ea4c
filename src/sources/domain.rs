use crate::models::DomainInfo;
use super::http::HttpClient;
use tracing::debug;

/// Check whether the email's domain serves a website.
pub async fn probe_domain(http: &HttpClient, domain: &str) -> DomainInfo {
    let url = format!("http://{}", domain);
    match http.get_page(&url).await {
        Ok(page) => DomainInfo {
            domain: domain.to_string(),
            website_accessible: page.is_ok(),
            status_code: Some(page.status),
        },
        Err(e) => {
            debug!(domain, error = %e, "Domain probe failed");
            DomainInfo {
                domain: domain.to_string(),
                website_accessible: false,
                status_code: None,
            }
        }
    }
}
