//! Audio subsystem rules: monitoring device failures and buffering.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::report::Finding;
use crate::search::{find_all, find_all_indexed};

/// Buffering growth line, e.g.
/// `Adding 40 milliseconds of audio buffering, total audio buffering is
/// now 620 milliseconds (source: Mic/Aux)`. The source suffix is optional.
static AUDIO_BUF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)adding (?P<added>\d+) milliseconds of audio buffering, total audio buffering is now (?P<total>\d+) milliseconds( \(source: (?P<source>.*)\))?$",
    )
    .unwrap()
});

pub fn monitoring_device(doc: &LogDocument) -> Option<Finding> {
    if find_all("audio_monitor_init_wasapi: Failed", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::critical(
        "Audio Monitoring Device Failure",
        "Your audio monitoring device failed to load. To correct this:<br><br>\
1) Go to Settings -> Audio and set your monitoring device to something other than what it is now. \
Press Apply.<br>\
2) Restart OBS.<br>\
3) Go to Settings -> Audio and set your monitoring device to the correct one. Press Apply.",
    ))
}

/// Max-buffering beats the 500ms threshold check; when the growth line
/// right after the marker names a source, the finding calls it out as the
/// likely offender.
pub fn buffering(doc: &LogDocument) -> Option<Finding> {
    let max_hits = find_all_indexed("Max audio buffering reached!", doc.lines());
    if !max_hits.is_empty() {
        let mut append = String::new();
        for (_, index) in &max_hits {
            let Some(next) = doc.line(index + 1) else { continue };
            if let Some(caps) = AUDIO_BUF_RE.captures(next) {
                if let Some(source) = caps.name("source") {
                    append = format!(
                        "<br><br>Source affected (potential cause): <strong>{}</strong>",
                        source.as_str()
                    );
                    break;
                }
            }
        }
        return Some(Finding::info(
            "Max Audio Buffering",
            format!(
                "Audio buffering hit the maximum value. This can be an indicator of very high system \
load and may affect stream latency or cause individual audio sources to stop working. Keep an eye on \
CPU usage especially, and close background programs if needed.<br><br>Occasionally, this can be \
caused by incorrect device timestamps. Restart OBS to reset buffering.{append}"
            ),
        ));
    }

    let growth = find_all("total audio buffering is now", doc.lines());
    let peak = growth
        .iter()
        .filter_map(|l| AUDIO_BUF_RE.captures(l))
        .filter_map(|caps| caps["total"].parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    if peak > 500 {
        return Some(Finding::info(
            "High Audio Buffering",
            "Audio buffering reached values above 500ms. This is an indicator of very high system \
load and may affect stream latency. Keep an eye on CPU usage especially, and close background \
programs if needed. Restart OBS to reset buffering.",
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::doc;

    #[test]
    fn max_buffering_names_the_source() {
        let d = doc(&[
            "line", "line", "line", "line", "line", "line", "line", "line", "line", "line",
            "12:00:00.000: Max audio buffering reached!",
            "12:00:00.000: Adding 40 milliseconds of audio buffering, total audio buffering is now 620 milliseconds (source: Mic/Aux)",
        ]);
        let f = buffering(&d).unwrap();
        assert_eq!(f.title, "Max Audio Buffering");
        assert!(f.detail.contains("Mic/Aux"));
    }

    #[test]
    fn max_buffering_without_source_suffix_still_reports() {
        let d = doc(&[
            "12:00: Max audio buffering reached!",
            "12:00: Adding 21 milliseconds of audio buffering, total audio buffering is now 980 milliseconds",
        ]);
        let f = buffering(&d).unwrap();
        assert_eq!(f.title, "Max Audio Buffering");
        assert!(!f.detail.contains("Source affected"));
    }

    #[test]
    fn max_buffering_as_last_line_does_not_scan_past_end() {
        let d = doc(&["12:00: Max audio buffering reached!"]);
        assert!(buffering(&d).is_some());
    }

    #[test]
    fn high_buffering_above_threshold() {
        let d = doc(&[
            "12:00: Adding 21 milliseconds of audio buffering, total audio buffering is now 501 milliseconds (source: Desktop Audio)",
        ]);
        assert_eq!(buffering(&d).unwrap().title, "High Audio Buffering");
    }

    #[test]
    fn moderate_buffering_is_clean() {
        let d = doc(&[
            "12:00: Adding 21 milliseconds of audio buffering, total audio buffering is now 120 milliseconds (source: Desktop Audio)",
        ]);
        assert_eq!(buffering(&d), None);
    }

    #[test]
    fn monitoring_failure_is_critical() {
        let d = doc(&["12:00: audio_monitor_init_wasapi: Failed to initialize"]);
        assert!(monitoring_device(&d).is_some());
    }
}
