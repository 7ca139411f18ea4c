use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use crate::models::Finding;
use crate::utils::text::normalize_text;
use url::Url;

/// Collapse findings that describe the same activity.
///
/// Two findings collide when platform, type and canonical URL agree (or,
/// without a URL, the normalised snippet/title). The first occurrence keeps
/// its position; later ones contribute their identifiers and an earlier
/// timestamp if they have one.
pub fn deduplicate_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Finding> = Vec::with_capacity(findings.len());

    for finding in findings {
        match index.entry(dedup_key(&finding)) {
            Entry::Vacant(e) => {
                e.insert(unique.len());
                unique.push(finding);
            }
            Entry::Occupied(e) => merge_into(&mut unique[*e.get()], finding),
        }
    }
    unique
}

fn merge_into(kept: &mut Finding, other: Finding) {
    for id in other.identifiers {
        if !kept.identifiers.contains(&id) {
            kept.identifiers.push(id);
        }
    }
    kept.timestamp = match (kept.timestamp, other.timestamp) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    let evidence = &mut kept.evidence;
    if evidence.title.is_none() {
        evidence.title = other.evidence.title;
    }
    if evidence.snippet.is_none() {
        evidence.snippet = other.evidence.snippet;
    }
    if evidence.author.is_none() {
        evidence.author = other.evidence.author;
    }
}

fn dedup_key(finding: &Finding) -> String {
    let evidence = &finding.evidence;
    let text = evidence.snippet.as_deref().or(evidence.title.as_deref());
    let subject = match (evidence.url.as_deref(), text) {
        (Some(url), _) => canonical_url(url),
        (None, Some(text)) => normalize_text(text),
        // Nothing to compare on; fall back to who matched and when.
        (None, None) => {
            let when = finding.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default();
            format!("{}@{}", finding.identifiers.join(",").to_lowercase(), when)
        }
    };
    format!("{}|{}|{}", finding.source_platform, finding.finding_type, subject)
}

/// Lowercase scheme and host, no fragment, no trailing slash.
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => trimmed.trim_end_matches('/').to_lowercase(),
    }
}

/// Timestamp ascending with undated findings last, then platform, then type.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        let by_time = match (a.timestamp, b.timestamp) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time
            .then_with(|| a.source_platform.cmp(&b.source_platform))
            .then_with(|| a.finding_type.cmp(&b.finding_type))
    });
}
