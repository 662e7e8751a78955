//! Report rendering: the JSON wire shape and the plain-text CLI output.

use engine::{AnalysisReport, Finding};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// The wire shape: one array per severity. With `detailed` each entry is
/// `{"title", "details"}`, otherwise just the title string.
pub fn to_json(report: &AnalysisReport, detailed: bool) -> Value {
    let entry = |f: &Finding| -> Value {
        if detailed {
            json!({ "title": f.title, "details": f.detail })
        } else {
            json!(f.title)
        }
    };
    json!({
        "critical": report.critical.iter().map(entry).collect::<Vec<_>>(),
        "warning": report.warning.iter().map(entry).collect::<Vec<_>>(),
        "info": report.info.iter().map(entry).collect::<Vec<_>>(),
    })
}

/// Strip the inline HTML markup the finding details carry, keeping line
/// breaks readable in a terminal.
fn plain(detail: &str) -> String {
    let with_breaks = detail.replace("<br>", "\n").replace("</li>", "\n");
    TAG_RE.replace_all(&with_breaks, "").to_string()
}

/// One-line-per-bucket summary of all finding titles.
pub fn summary_text(report: &AnalysisReport) -> String {
    let titles = |findings: &[Finding]| {
        findings
            .iter()
            .map(|f| f.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Critical: {}\nWarning: {}\nInfo: {}",
        titles(&report.critical),
        titles(&report.warning),
        titles(&report.info)
    )
}

/// Full details, Critical first, markup stripped.
pub fn details_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    for (label, findings) in [
        ("Critical", &report.critical),
        ("Warning", &report.warning),
        ("Info", &report.info),
    ] {
        if findings.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{label}:\n"));
        for f in findings {
            out.push_str(&format!("  {}\n", f.title));
            for line in plain(&f.detail).lines().filter(|l| !l.trim().is_empty()) {
                out.push_str(&format!("    {}\n", line.trim()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> AnalysisReport {
        AnalysisReport::from_findings(
            Some("desc".into()),
            vec![
                Finding::critical("Crash", "It crashed.<br>See <a href=\"x\">guide</a>."),
                Finding::info("Note", "Plain text."),
            ],
        )
    }

    #[test]
    fn compact_json_carries_titles_only() {
        let value = to_json(&report(), false);
        assert_eq!(value["critical"], json!(["Crash"]));
        assert_eq!(value["warning"], json!([]));
        assert_eq!(value["info"], json!(["Note"]));
    }

    #[test]
    fn detailed_json_carries_title_and_details() {
        let value = to_json(&report(), true);
        assert_eq!(value["critical"][0]["title"], "Crash");
        assert!(value["critical"][0]["details"]
            .as_str()
            .unwrap()
            .contains("It crashed."));
    }

    #[test]
    fn text_output_strips_markup() {
        let text = details_text(&report());
        assert!(text.contains("It crashed."));
        assert!(text.contains("See guide."));
        assert!(!text.contains('<'));
    }

    #[test]
    fn summary_lists_titles_per_bucket() {
        let text = summary_text(&report());
        assert!(text.contains("Critical: Crash"));
        assert!(text.contains("Info: Note"));
    }
}
