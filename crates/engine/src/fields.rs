//! Tolerant extraction of `key: value` fields from a block of lines.
//!
//! Settings dumps in the log follow an anchor line ("video settings
//! reset:", "...'stream' settings:") with tab-indented `key: value` lines
//! and end at the first line that doesn't match that shape. The scanner
//! walks forward from the anchor, stores the raw value of every requested
//! field it recognizes, and stops at the first unrecognized line.
//!
//! Degradation policy: a field that is absent, or whose value fails to
//! parse, stays unset. It never defaults to zero and never raises. Callers
//! with a documented fallback anchor re-run the scan there and merge; if
//! required fields are still unset after all fallbacks, the calling rule
//! declines to produce a finding rather than compute from partial data.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// A tab-prefixed `key: value` line inside a settings block. The key may
/// contain spaces ("base resolution", "YUV mode").
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\t(?P<key>[A-Za-z][\w ]*?):\s*(?P<value>.+?)\s*$").unwrap()
});

/// Raw field values extracted from one block scan, keyed by the requested
/// field name.
#[derive(Debug, Default, Clone)]
pub struct FieldBlock {
    values: HashMap<String, String>,
    end: usize,
}

impl FieldBlock {
    /// Scan forward from `anchor + 1`, capturing values for every line
    /// whose key contains one of the requested `names`. Later occurrences
    /// of the same field overwrite earlier ones.
    pub fn scan(lines: &[String], anchor: usize, names: &[&str]) -> Self {
        let mut values = HashMap::new();
        let mut index = anchor + 1;
        while index < lines.len() {
            let Some(caps) = FIELD_RE.captures(&lines[index]) else {
                break;
            };
            let key = &caps["key"];
            let value = &caps["value"];
            for name in names {
                if key.contains(name) {
                    values.insert(name.to_string(), value.to_string());
                }
            }
            index += 1;
        }
        Self { values, end: index }
    }

    /// Index of the first line past the scanned block. Callers use this to
    /// bound the search for a fallback anchor.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Copy fields from `other` that are unset here (fallback recovery).
    pub fn merge_missing_from(&mut self, other: &FieldBlock) {
        for (k, v) in &other.values {
            self.values.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Raw captured value, untouched.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Last whitespace-separated token of the value, parsed as a number.
    /// Tolerates a percent suffix and a decimal comma. Unparsable → None.
    pub fn number(&self, name: &str) -> Option<f64> {
        parse_loose(self.values.get(name)?.split_whitespace().last()?)
    }

    /// Last token of the value split on `sep` into a numeric pair, e.g.
    /// `1920x1080` with `'x'` or `60/1` with `'/'`.
    pub fn pair(&self, name: &str, sep: char) -> Option<(f64, f64)> {
        let token = self.values.get(name)?.split_whitespace().last()?;
        let (a, b) = token.split_once(sep)?;
        Some((parse_loose(a)?, parse_loose(b)?))
    }
}

fn parse_loose(token: &str) -> Option<f64> {
    token.trim().trim_end_matches('%').replace(',', ".").parse().ok()
}

/// Maximum of all parenthesized percentage values across the given lines,
/// e.g. `skipped frames due to encoding lag (3.1%)`. Values that fail to
/// parse count as zero; if the maximum is zero the caller must not emit a
/// finding, so this returns `None` in that case.
pub fn peak_percent(lines: &[&str]) -> Option<f64> {
    let mut max = 0.0_f64;
    for line in lines {
        let Some(open) = line.find('(') else { continue };
        let Some(close) = line[open..].find(')') else { continue };
        let inner = &line[open + 1..open + close];
        if let Some(v) = parse_loose(inner) {
            if v > max {
                max = v;
            }
        }
    }
    (max > 0.0).then_some(max)
}
