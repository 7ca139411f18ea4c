use std::fmt::Write;
use std::path::Path;
use crate::identity::EmailAddress;
use crate::models::{ActivityReport, Finding, FindingCounts, FindingType, ScanStatus, SourceStatus};
use crate::utils::format_duration;

pub fn search_banner(email: &EmailAddress) -> String {
    format!("Searching for activity linked to: {}", email)
}

/// The bullet lines and the closing "Results saved" line.
///
/// The three core counts always print; the rest only when non-zero.
pub fn summary_lines(counts: &FindingCounts, report_path: &Path) -> Vec<String> {
    let mut lines = vec![
        format!("- Found {} comments across platforms", counts.comments),
        format!("- Discovered {} forum posts", counts.forum_posts),
        format!("- Identified {} profile mentions", counts.profile_mentions),
    ];
    if counts.commits > 0 {
        lines.push(format!("- Linked {} commits", counts.commits));
    }
    if counts.breaches > 0 {
        lines.push(format!("- Matched {} data breaches", counts.breaches));
    }
    if counts.web_mentions > 0 {
        lines.push(format!("- Spotted {} web mentions", counts.web_mentions));
    }
    lines.push(format!("Results saved to {}", display_path(report_path)));
    lines
}

/// Bare file name when the file sits in the current directory.
pub fn display_path(path: &Path) -> String {
    let in_cwd = match path.parent() {
        None => true,
        Some(parent) => parent.as_os_str().is_empty() || parent == Path::new("."),
    };
    match path.file_name() {
        Some(name) if in_cwd => name.to_string_lossy().into_owned(),
        _ => path.display().to_string(),
    }
}

fn section_title(ty: FindingType) -> &'static str {
    match ty {
        FindingType::Comment => "Comments",
        FindingType::ForumPost => "Forum posts",
        FindingType::ProfileMention => "Profile mentions",
        FindingType::Commit => "Commits",
        FindingType::Breach => "Data breaches",
        FindingType::WebMention => "Web mentions",
    }
}

fn status_label(status: SourceStatus) -> &'static str {
    match status {
        SourceStatus::Ok => "ok",
        SourceStatus::Failed => "failed",
        SourceStatus::TimedOut => "timed out",
        SourceStatus::Skipped => "skipped",
        SourceStatus::Cancelled => "cancelled",
    }
}

/// Same spelling as the `status` field of the JSON report.
fn scan_status_label(status: ScanStatus) -> &'static str {
    match status {
        ScanStatus::Completed => "completed",
        ScanStatus::Interrupted => "interrupted",
        ScanStatus::Failed => "failed",
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

pub fn format_finding_markdown(finding: &Finding) -> String {
    let when = finding
        .timestamp
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    let evidence = &finding.evidence;
    let label = evidence
        .title
        .as_deref()
        .or(evidence.snippet.as_deref())
        .unwrap_or(finding.finding_type.as_str());

    let mut line = format!("- **{}** [{}] ", when, finding.source_platform);
    match evidence.url.as_deref() {
        Some(url) => { let _ = write!(line, "[{}]({})", escape_cell(label), url); }
        None => line.push_str(&escape_cell(label)),
    }
    if let Some(author) = evidence.author.as_deref() {
        let _ = write!(line, " by {}", author);
    }
    line.push_str(&format!(" (matched: {})\n", finding.identifiers.join(", ")));
    if let (Some(snippet), Some(_)) = (evidence.snippet.as_deref(), evidence.title.as_deref()) {
        let _ = writeln!(line, "  > {}", escape_cell(snippet));
    }
    line
}

pub fn render_markdown(report: &ActivityReport) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Activity report for {}\n", report.email);
    let _ = writeln!(md, "- Scan: `{}`", report.scan_id);
    let _ = writeln!(md, "- Date: {}", report.scan_date.to_rfc3339());
    let _ = writeln!(md, "- Status: {}", scan_status_label(report.status));
    let _ = writeln!(
        md,
        "- Usernames tried: {}",
        report.identifiers.variations.join(", ")
    );
    if let Some(since) = report.window.since {
        let _ = writeln!(md, "- Since: {}", since.to_rfc3339());
    }
    if let Some(until) = report.window.until {
        let _ = writeln!(md, "- Until: {}", until.to_rfc3339());
    }
    if let Some(domain) = &report.domain_info {
        let reach = if domain.website_accessible { "reachable" } else { "unreachable" };
        let _ = writeln!(md, "- Domain: {} ({})", domain.domain, reach);
    }

    let counts = &report.summary;
    md.push_str("\n## Summary\n\n| Type | Count |\n|---|---|\n");
    for (ty, n) in [
        (FindingType::Comment, counts.comments),
        (FindingType::ForumPost, counts.forum_posts),
        (FindingType::ProfileMention, counts.profile_mentions),
        (FindingType::Commit, counts.commits),
        (FindingType::Breach, counts.breaches),
        (FindingType::WebMention, counts.web_mentions),
    ] {
        let _ = writeln!(md, "| {} | {} |", section_title(ty), n);
    }
    let _ = writeln!(md, "| **Total** | **{}** |", counts.total);

    md.push_str("\n## Sources\n\n| Source | Status | Findings | Time | Note |\n|---|---|---|---|---|\n");
    for source in &report.sources {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            source.name,
            status_label(source.status),
            source.findings,
            format_duration(source.duration_ms),
            escape_cell(source.error.as_deref().unwrap_or("")),
        );
    }

    for ty in FindingType::ALL {
        let group: Vec<&Finding> = report.findings.iter().filter(|f| f.finding_type == ty).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(md, "\n## {}\n", section_title(ty));
        for finding in group {
            md.push_str(&format_finding_markdown(finding));
        }
    }
    md
}
