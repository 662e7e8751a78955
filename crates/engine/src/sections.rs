//! Structural boundaries derived from the line sequence.
//!
//! OBS logs carry three marker classes:
//!
//! - a 48-dash divider closing each major dump (scene lists, settings
//!   resets) — the "section" markers that bound a session's scene list,
//! - a 33-dash divider that always appears before the first section; the
//!   system fingerprint (OS, CPU) lives above the first one,
//! - `- scene` declarations inside a session's scene dump.
//!
//! Boundary sequences are pure functions of the document: non-decreasing,
//! in-range, and independent of any rule having run. Note the 33-dash
//! marker is a substring of the 48-dash marker, so every section index is
//! also a subsection index; callers rely only on ordering, never on the
//! two sets being disjoint.

/// 48 dashes: closes scene lists and other major dumps.
pub const SECTION_MARKER: &str = "------------------------------------------------";

/// 33 dashes: separates the system fingerprint from everything below.
pub const SUBSECTION_MARKER: &str = "---------------------------------";

/// Prefix of a scene declaration inside a scene dump.
pub const SCENE_MARKER: &str = "- scene";

/// Indices of section divider lines, ascending.
pub fn sections(lines: &[String]) -> Vec<usize> {
    marker_positions(SECTION_MARKER, lines)
}

/// Indices of subsection divider lines, ascending.
pub fn subsections(lines: &[String]) -> Vec<usize> {
    marker_positions(SUBSECTION_MARKER, lines)
}

/// Indices of scene declaration lines, ascending.
pub fn scene_markers(lines: &[String]) -> Vec<usize> {
    marker_positions(SCENE_MARKER, lines)
}

fn marker_positions(marker: &str, lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(marker))
        .map(|(i, _)| i)
        .collect()
}

/// Smallest boundary strictly greater than `anchor`, or `doc_len` if none.
/// `[anchor, next_boundary(anchor, ..))` is the half-open range that scopes
/// a rule to "this scene only" or "this session only".
pub fn next_boundary(anchor: usize, boundaries: &[usize], doc_len: usize) -> usize {
    boundaries
        .iter()
        .copied()
        .find(|&b| b > anchor)
        .unwrap_or(doc_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn synthetic_log() -> Vec<String> {
        lines(&[
            "12:00:00.000: CPU Name: Example",                // 0
            "12:00:00.000: OBS 30.0.0 (64 bit, windows)",     // 1
            "12:00:00.001: ---------------------------------", // 2
            "12:00:00.002: video settings reset:",            // 3
            "12:00:00.100: Loaded scenes:",                   // 4
            "12:00:00.100: - scene 'Main':",                  // 5
            "12:00:00.100:     - source: 'Game' (game_capture)", // 6
            "12:00:00.100: - scene 'BRB':",                   // 7
            "12:00:00.101: ------------------------------------------------", // 8
        ])
    }

    #[test]
    fn boundaries_are_ascending_and_in_range() {
        let ls = synthetic_log();
        for set in [sections(&ls), subsections(&ls), scene_markers(&ls)] {
            assert!(set.windows(2).all(|w| w[0] <= w[1]));
            assert!(set.iter().all(|&i| i < ls.len()));
        }
    }

    #[test]
    fn subsections_include_sections() {
        // The 33-dash marker is a prefix of the 48-dash marker.
        let ls = synthetic_log();
        assert_eq!(subsections(&ls), vec![2, 8]);
        assert_eq!(sections(&ls), vec![8]);
    }

    #[test]
    fn scene_markers_found() {
        let ls = synthetic_log();
        assert_eq!(scene_markers(&ls), vec![5, 7]);
    }

    #[test]
    fn next_boundary_returns_first_strictly_greater() {
        let bounds = vec![2, 8];
        assert_eq!(next_boundary(0, &bounds, 9), 2);
        assert_eq!(next_boundary(2, &bounds, 9), 8);
        assert_eq!(next_boundary(8, &bounds, 9), 9);
    }

    #[test]
    fn next_boundary_is_monotonic() {
        let bounds = vec![3, 7, 11];
        let len = 20;
        for a1 in 0..len {
            for a2 in a1..len {
                assert!(next_boundary(a1, &bounds, len) <= next_boundary(a2, &bounds, len));
            }
        }
    }

    #[test]
    fn next_boundary_past_last_is_document_length() {
        assert_eq!(next_boundary(100, &[1, 2, 3], 50), 50);
        assert_eq!(next_boundary(0, &[], 50), 50);
    }
}
