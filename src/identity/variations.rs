/// Derive the username variations probed on username-keyed platforms.
///
/// Order is most-likely-first; callers take a prefix of this list.
pub fn generate_variations(base: &str) -> Vec<String> {
    let candidates = [
        base.to_string(),
        format!("{}1", base),
        format!("{}123", base),
        format!("the{}", base),
        format!("real{}", base),
        base.chars().take(8).collect(),
        base.chars().take(4).collect(),
        base.to_uppercase(),
    ];

    let mut variations: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if base.is_empty() || candidate.is_empty() || variations.contains(&candidate) {
            continue;
        }
        variations.push(candidate);
    }
    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variations_start_with_base() {
        let v = generate_variations("example");
        assert_eq!(v[0], "example");
        assert_eq!(&v[1..3], &["example1".to_string(), "example123".to_string()]);
    }

    #[test]
    fn test_variations_include_prefixes_and_uppercase() {
        let v = generate_variations("johnathandoe");
        assert!(v.contains(&"thejohnathandoe".to_string()));
        assert!(v.contains(&"realjohnathandoe".to_string()));
        assert!(v.contains(&"johnatha".to_string()));
        assert!(v.contains(&"john".to_string()));
        assert!(v.contains(&"JOHNATHANDOE".to_string()));
    }

    #[test]
    fn test_short_base_has_no_duplicates() {
        // Truncations collapse onto the base itself.
        let v = generate_variations("bob");
        assert_eq!(v, vec!["bob", "bob1", "bob123", "thebob", "realbob", "BOB"]);
    }

    #[test]
    fn test_empty_base_yields_nothing() {
        assert!(generate_variations("").is_empty());
    }
}
