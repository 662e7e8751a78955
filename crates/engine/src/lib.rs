//! Diagnostic rule engine for OBS Studio log files.
//!
//! The engine treats a log as an ordered sequence of opaque text lines and
//! runs a fixed catalog of independent diagnostic rules against it, producing
//! a severity-classified list of findings. There is deliberately no log
//! grammar: rules locate anchor lines by substring, then apply their own
//! capture patterns. This keeps the analysis resilient to format drift.
//!
//! # Architecture
//!
//! - `document.rs`: the immutable line sequence handed in by the caller
//! - `search.rs`: substring search primitives (all / indexed / excluding)
//! - `sections.rs`: structural boundaries (sections, subsections, scenes)
//! - `fields.rs`: tolerant `key: value` block extraction after an anchor
//! - `report.rs`: severity / finding / report vocabulary
//! - `catalog.rs`: the registered gating + independent rule sets
//! - `engine.rs`: orchestration, deduplication, severity bucketing
//! - `rules/`: the rule bodies, one module per diagnostic area
//!
//! Rules are pure and read-only; a rule that cannot determine an answer
//! returns no finding instead of an error. The engine has no error channel.

pub mod catalog;
pub mod document;
pub mod engine;
pub mod fields;
pub mod report;
pub mod rules;
pub mod search;
pub mod sections;

pub use catalog::Catalog;
pub use document::LogDocument;
pub use engine::run;
pub use report::{AnalysisReport, Finding, Severity};

/// Latest released OBS Studio version, used by the old-version rule.
pub const CURRENT_VERSION: &str = "30.2.3";
