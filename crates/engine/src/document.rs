//! The immutable log document handed to the engine.
//!
//! A document is an ordered sequence of text lines, 0-indexed, in original
//! file order. Nothing is removed or reordered; trailing carriage returns
//! are stripped once at construction so rules never have to care about
//! CRLF uploads.

/// An immutable, ordered sequence of log lines.
///
/// Created once per analysis request and discarded after the engine
/// returns. Rules receive it by shared reference only.
#[derive(Debug, Clone)]
pub struct LogDocument {
    lines: Vec<String>,
}

impl LogDocument {
    /// Build a document from raw log text (splits on `\n`, strips `\r`).
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Self { lines }
    }

    /// Build a document from already-split lines.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let lines = lines
            .into_iter()
            .map(|l| {
                if l.ends_with('\r') {
                    l.trim_end_matches('\r').to_string()
                } else {
                    l
                }
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line at `index`, or `None` past the end. Rules that scan
    /// relative to a match use this instead of indexing directly.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// First non-empty line, used by renderers as the document description.
    /// This is report metadata, not a finding.
    pub fn description(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_splits_and_strips_cr() {
        let doc = LogDocument::from_text("first\r\nsecond\nthird");
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.line(0), Some("first"));
        assert_eq!(doc.line(1), Some("second"));
        assert_eq!(doc.line(2), Some("third"));
    }

    #[test]
    fn line_past_end_is_none() {
        let doc = LogDocument::from_text("only");
        assert_eq!(doc.line(1), None);
    }

    #[test]
    fn description_skips_blank_lines() {
        let doc = LogDocument::from_text("\n   \n12:00:00.000: OBS 30.0.0\nmore");
        assert_eq!(doc.description(), Some("12:00:00.000: OBS 30.0.0"));
    }

    #[test]
    fn description_of_empty_document_is_none() {
        let doc = LogDocument::from_text("");
        assert_eq!(doc.description(), None);
    }

    #[test]
    fn from_lines_strips_cr() {
        let doc = LogDocument::from_lines(vec!["a\r".to_string(), "b".to_string()]);
        assert_eq!(doc.line(0), Some("a"));
        assert_eq!(doc.line(1), Some("b"));
    }
}
