//! The shared result vocabulary produced by every rule.

use serde::Serialize;

/// Ordered severity scale. Ordering is significant: overload percentages
/// map to Info/Warning/Critical by magnitude, and reports sort buckets
/// from Critical down. `None` findings never appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None = 0,
    Info = 1,
    Warning = 2,
    Critical = 3,
}

/// A single diagnostic result. Two findings are equal iff all three
/// fields are equal; that triple is also the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub title: String,
    pub detail: String,
}

impl Finding {
    pub fn new(severity: Severity, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, detail)
    }

    pub fn warning(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, detail)
    }

    pub fn critical(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Critical, title, detail)
    }
}

/// The final analysis result: distinct findings partitioned by severity,
/// relative order preserved within each bucket. Ownership transfers to the
/// renderer; the engine retains nothing after returning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Document description (first non-empty log line), report metadata
    /// rather than a finding.
    pub description: Option<String>,
    pub critical: Vec<Finding>,
    pub warning: Vec<Finding>,
    pub info: Vec<Finding>,
}

impl AnalysisReport {
    /// Partition an already-deduplicated finding sequence by severity.
    /// `Severity::None` entries are dropped.
    pub fn from_findings(description: Option<String>, findings: Vec<Finding>) -> Self {
        let mut report = Self {
            description,
            ..Self::default()
        };
        for finding in findings {
            match finding.severity {
                Severity::Critical => report.critical.push(finding),
                Severity::Warning => report.warning.push(finding),
                Severity::Info => report.info.push(finding),
                Severity::None => {}
            }
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.warning.is_empty() && self.info.is_empty()
    }

    /// All findings, Critical first, bucket order preserved.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.critical
            .iter()
            .chain(self.warning.iter())
            .chain(self.info.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_by_magnitude() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::None);
    }

    #[test]
    fn findings_equal_iff_all_fields_equal() {
        let a = Finding::info("T", "D");
        let b = Finding::info("T", "D");
        let c = Finding::warning("T", "D");
        let d = Finding::info("T", "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn bucketing_is_exhaustive_and_exclusive() {
        let report = AnalysisReport::from_findings(
            None,
            vec![
                Finding::critical("c", ""),
                Finding::warning("w", ""),
                Finding::info("i", ""),
                Finding::new(Severity::None, "hidden", ""),
            ],
        );
        assert_eq!(report.critical.len(), 1);
        assert_eq!(report.warning.len(), 1);
        assert_eq!(report.info.len(), 1);
        assert_eq!(report.iter().count(), 3, "None-severity never appears");
    }

    #[test]
    fn bucket_order_is_preserved() {
        let report = AnalysisReport::from_findings(
            None,
            vec![
                Finding::info("first", ""),
                Finding::critical("c", ""),
                Finding::info("second", ""),
            ],
        );
        let titles: Vec<&str> = report.info.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
