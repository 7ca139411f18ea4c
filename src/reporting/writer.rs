use std::path::{Path, PathBuf};
use crate::errors::DigfootError;
use crate::identity::EmailAddress;
use crate::models::ActivityReport;
use super::formatter::render_markdown;
use tracing::info;

/// `<local-part>_activity.json`
pub fn report_file_name(email: &EmailAddress) -> String {
    format!("{}_activity.json", file_stem(email))
}

pub fn markdown_file_name(email: &EmailAddress) -> String {
    format!("{}_activity.md", file_stem(email))
}

fn file_stem(email: &EmailAddress) -> String {
    email
        .local_part()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-') { c } else { '_' })
        .collect()
}

/// Write the report as pretty JSON, replacing any previous file atomically.
pub async fn write_json_report(report: &ActivityReport, dir: &Path) -> Result<PathBuf, DigfootError> {
    let path = dir.join(report_file_name(&report.email));
    let json = serde_json::to_string_pretty(report)?;
    write_atomic(&path, json.as_bytes()).await?;
    info!(path = %path.display(), findings = report.findings.len(), "Wrote activity report");
    Ok(path)
}

pub async fn write_markdown_report(report: &ActivityReport, dir: &Path) -> Result<PathBuf, DigfootError> {
    let path = dir.join(markdown_file_name(&report.email));
    write_atomic(&path, render_markdown(report).as_bytes()).await?;
    info!(path = %path.display(), "Wrote markdown report");
    Ok(path)
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DigfootError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
