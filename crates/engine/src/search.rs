//! Substring search primitives over an ordered line sequence.
//!
//! These are the only line-location tools rules get. All three are pure,
//! total functions: an empty match set is a normal result, not an error.
//! Where a rule needs structured capture it applies its own regex to the
//! lines returned here; the search functions never interpret patterns.

/// All lines containing `needle`, in document order.
pub fn find_all<'a>(needle: &str, lines: &'a [String]) -> Vec<&'a str> {
    lines
        .iter()
        .filter(|l| l.contains(needle))
        .map(String::as_str)
        .collect()
}

/// All lines containing `needle`, paired with their 0-based position.
/// Required whenever a rule inspects lines relative to a match.
pub fn find_all_indexed<'a>(needle: &str, lines: &'a [String]) -> Vec<(&'a str, usize)> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(needle))
        .map(|(i, l)| (l.as_str(), i))
        .collect()
}

/// Like [`find_all`] but drops matches containing any excluded substring.
/// Used to suppress known-benign occurrences of an otherwise alarming
/// marker (e.g. dropped frames produced by the connectivity test).
pub fn find_all_excluding<'a>(
    needle: &str,
    lines: &'a [String],
    exclude: &[&str],
) -> Vec<&'a str> {
    lines
        .iter()
        .filter(|l| l.contains(needle) && !exclude.iter().any(|e| l.contains(e)))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn find_all_returns_matching_subsequence() {
        let ls = lines(&["alpha one", "beta", "alpha two", "gamma"]);
        let hits = find_all("alpha", &ls);
        assert_eq!(hits, vec!["alpha one", "alpha two"]);
    }

    #[test]
    fn find_all_is_case_sensitive() {
        let ls = lines(&["Alpha", "alpha"]);
        assert_eq!(find_all("alpha", &ls), vec!["alpha"]);
    }

    #[test]
    fn find_all_empty_result_is_normal() {
        let ls = lines(&["nothing here"]);
        assert!(find_all("missing", &ls).is_empty());
    }

    #[test]
    fn find_all_indexed_positions_are_correct() {
        let ls = lines(&["x", "needle a", "x", "needle b"]);
        let hits = find_all_indexed("needle", &ls);
        assert_eq!(hits, vec![("needle a", 1), ("needle b", 3)]);
        for (line, idx) in hits {
            assert_eq!(ls[idx], line);
        }
    }

    #[test]
    fn find_all_excluding_drops_excluded_matches() {
        let ls = lines(&[
            "dropped frames (5%)",
            "dropped frames test_stream (90%)",
            "dropped frames (1%)",
        ]);
        let hits = find_all_excluding("dropped frames", &ls, &["test_stream"]);
        assert_eq!(hits, vec!["dropped frames (5%)", "dropped frames (1%)"]);
    }

    #[test]
    fn find_all_excluding_with_no_exclusions_matches_find_all() {
        let ls = lines(&["a needle", "b"]);
        assert_eq!(find_all_excluding("needle", &ls, &[]), find_all("needle", &ls));
    }
}
