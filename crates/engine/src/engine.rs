//! Analysis driver: gates, independent rules, scene scan, dedup, report.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::document::LogDocument;
use crate::report::{AnalysisReport, Finding};
use crate::rules::sources;

/// Run the full analysis over one document.
///
/// Gating rules run first, in catalog order. The first gate that halts
/// makes its finding the sole content of the report; a gate that merely
/// contributes a finding lets the analysis continue. Independent rules
/// then run in catalog order, followed by the per-scene scan. Duplicate
/// findings are dropped, keeping the first occurrence, before the
/// severity partition.
pub fn run(doc: &LogDocument, catalog: &Catalog) -> AnalysisReport {
    let description = doc.description().map(str::to_owned);
    if description.is_none() {
        debug!("document has no content");
        return AnalysisReport::from_findings(
            None,
            vec![Finding::critical("NO LOG", "URL or file doesn't contain a log.")],
        );
    }

    let mut findings: Vec<Finding> = Vec::new();
    for gate in &catalog.gates {
        let (halt, finding) = (gate.run)(doc);
        if halt {
            debug!(gate = gate.name, "analysis halted");
            return AnalysisReport::from_findings(description, finding.into_iter().collect());
        }
        if let Some(f) = finding {
            findings.push(f);
        }
    }

    for rule in &catalog.rules {
        let produced = (rule.run)(doc);
        trace!(rule = rule.name, findings = produced.len());
        findings.extend(produced);
    }
    findings.extend(sources::scan_scenes(doc));

    let mut seen = HashSet::new();
    findings.retain(|f| seen.insert(f.clone()));

    AnalysisReport::from_findings(description, findings)
}
