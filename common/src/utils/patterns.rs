use std::collections::BTreeSet;

/// Canonicalize a collection of glob patterns: trim each entry, drop
/// empties, deduplicate. `None` means no filtering constraint was
/// requested, which downstream consumers treat differently from a
/// filter that matches nothing.
pub fn normalize_patterns<I, S>(patterns: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = patterns
        .into_iter()
        .map(|p| p.as_ref().trim().to_owned())
        .filter(|p| !p.is_empty())
        .collect();

    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

/// Parse a comma-delimited pattern list as sent by the flat-parameter
/// transport. Malformed tokens are dropped by the trim/empty rule, not
/// reported.
pub fn parse_pattern_list(raw: &str) -> Option<BTreeSet<String>> {
    normalize_patterns(raw.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_delimited_list() {
        let set = parse_pattern_list("*.py, *.md, *.txt").unwrap();
        let expected: BTreeSet<String> = ["*.py", "*.md", "*.txt"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn trims_whitespace_and_drops_empty_tokens() {
        let set = parse_pattern_list("*.log,  *.tmp ,, ").unwrap();
        let expected: BTreeSet<String> = ["*.log", "*.tmp"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn deduplicates_entries() {
        let set = parse_pattern_list("*.rs,*.rs, *.rs").unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn all_empty_input_means_no_filter() {
        assert_eq!(parse_pattern_list(""), None);
        assert_eq!(parse_pattern_list(" , ,"), None);
        assert_eq!(normalize_patterns(Vec::<String>::new()), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let canonical = parse_pattern_list("*.py,*.md").unwrap();
        assert_eq!(normalize_patterns(&canonical), Some(canonical.clone()));
    }
}
