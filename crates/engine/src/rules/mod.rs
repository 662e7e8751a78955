//! The diagnostic rule bodies, one module per area of the log.
//!
//! Every rule is a pure function from the document to zero or more
//! findings. A rule that cannot determine an answer (missing anchor,
//! unparsable number, unmatched pattern) returns nothing; it never errors
//! and never aborts any other rule. Detail text keeps the inline HTML
//! markup the renderers expect.

pub mod audio;
pub mod core;
pub mod encoding;
pub mod graphics;
pub mod linux;
pub mod macos;
pub mod network;
pub mod plugins;
pub mod sources;
pub mod windows;

/// Boilerplate appended to findings that ask the user for a fresh log.
pub(crate) const CLEAN_LOG: &str = concat!(
    "<br><br>To make a clean log file, please follow these steps:<br><br>",
    "1) Restart OBS.<br>",
    "2) Start your stream/recording for at least 30 seconds (or however long it takes for the issue to happen). \
Make sure you replicate any issues as best you can, which means having any games/apps open and captured, etc.<br>",
    "3) Stop your stream/recording.<br>",
    "4) Select Help &gt; Log Files &gt; Upload Current Log File. Send that link via this troubleshooting tool \
or whichever support chat you are using."
);

/// Minimal HTML escaping for values interpolated into detail text.
pub(crate) fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a percentage for finding titles: whole numbers keep one decimal
/// ("15.0"), everything else prints as-is ("0.5", "7.2").
pub(crate) fn fmt_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
pub(crate) fn doc(lines: &[&str]) -> crate::LogDocument {
    crate::LogDocument::from_lines(lines.iter().map(|s| s.to_string()).collect())
}
