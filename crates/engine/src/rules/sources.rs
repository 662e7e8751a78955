//! Source-level rules and the per-scene composition scan.

use crate::document::LogDocument;
use crate::report::Finding;
use crate::search::find_all;
use crate::sections::{next_boundary, scene_markers, sections};

pub fn shared_memory_capture(doc: &LogDocument) -> Option<Finding> {
    if find_all("user is forcing shared memory", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Memory Capture",
        "SLI/Crossfire Capture Mode (shared memory capture) is enabled. This capture mode is \
significantly slower than regular capture and should only be used on SLI/Crossfire systems where \
normal capture does not work. Disable it in the settings of your game capture source unless you \
really need it.",
    ))
}

/// Hardware acceleration off in the browser source. User-disabled is
/// actionable; driver-blacklisted is informational only.
pub fn browser_accel(doc: &LogDocument) -> Option<Finding> {
    let disabled = !find_all("Browser Hardware Acceleration: false", doc.lines()).is_empty();
    let blacklisted = !find_all(
        "[obs-browser]: Blacklisted device detected, disabling browser source hardware acceleration",
        doc.lines(),
    )
    .is_empty();
    if disabled && !blacklisted {
        return Some(Finding::warning(
            "Browser Not Accelerated",
            "Browser hardware acceleration is disabled. Rendering browser sources will use much \
more CPU than necessary. Enable it in Settings -> Advanced unless you have a specific reason not \
to.",
        ));
    }
    if blacklisted {
        return Some(Finding::info(
            "Browser Not Accelerated",
            "Your GPU is blacklisted by the embedded browser, so browser source hardware \
acceleration was disabled automatically. Browser sources will render on the CPU. Updating your \
graphics drivers may resolve this.",
        ));
    }
    None
}

pub fn browser_source_missing(doc: &LogDocument) -> Option<Finding> {
    if find_all("Source ID 'browser_source' not found", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::critical(
        "Missing Browser Components",
        "The browser source components failed to load, so all browser sources in your scenes are \
missing. Reinstall OBS Studio with the \"Browser Source\" component enabled, and make sure your \
anti-virus software is not removing parts of the OBS installation.",
    ))
}

/// Inspect one scene's slice of the log for capture-source conflicts.
/// Returns the findings plus whether the scene carries a multiple-game-
/// capture violation.
fn check_scene_sources(lo: usize, hi: usize, lines: &[String]) -> (Vec<Finding>, bool) {
    let slice = &lines[lo..hi];
    let monitor = find_all("monitor_capture", slice);
    let game = find_all("game_capture", slice);
    let mut findings = Vec::new();
    let mut violation = false;
    if !monitor.is_empty() && !game.is_empty() {
        findings.push(Finding::warning(
            "Capture Interference",
            "A scene contains both a Display Capture and a Game Capture source. If the Display \
Capture shows the game as well, the two capture methods will interfere with each other and cause \
performance problems or a black Game Capture. Only use one of the two per scene.",
        ));
    }
    if game.len() > 1 {
        findings.push(Finding::warning(
            "Multiple Game Capture",
            "A scene contains more than one Game Capture source. Game Capture hooks only one game \
at a time, so multiple Game Captures in the same scene will fight over the hook and produce black \
or frozen captures. Use a single Game Capture source and change its target instead.",
        ));
        violation = true;
    }
    (findings, violation)
}

/// Walk every scene block in the log and collect composition findings.
///
/// Accumulation stops at the first scene that carries a multiple-game-
/// capture violation: the remaining scenes are still visited but their
/// findings are discarded, so one broken scene does not flood the report
/// with repeats. A log with no scenes and no sources at all gets the
/// onboarding pointer instead, unless sources were added live during the
/// session.
pub fn scan_scenes(doc: &LogDocument) -> Vec<Finding> {
    let lines = doc.lines();
    let scenes = scene_markers(lines);
    let source_lines = find_all(" - source:", lines);
    let added_live = find_all("User added source", lines);

    if !scenes.is_empty() && !source_lines.is_empty() {
        let section_bounds = sections(lines);
        let mut accumulated: Vec<Vec<Finding>> = Vec::new();
        let mut hit = false;
        for (i, &scene) in scenes.iter().enumerate() {
            let higher = if i == scenes.len() - 1 {
                next_boundary(scene, &section_bounds, lines.len())
            } else {
                next_boundary(scene, &scenes, lines.len())
            };
            let (set, violation) = check_scene_sources(scene, higher, lines);
            if !hit && !accumulated.contains(&set) {
                accumulated.push(set);
                hit = violation;
            }
        }
        return accumulated.into_iter().flatten().collect();
    }

    if !added_live.is_empty() {
        return Vec::new();
    }

    vec![Finding::info(
        "No Scenes/Sources",
        "There are no scenes or sources in this log. You need to set up at least one scene with \
the sources you want to capture before streaming or recording.<br><br>Get started with the \
<a href=\"https://obsproject.com/kb/quick-start-guide\">Quickstart Guide</a>, read the \
<a href=\"https://obsproject.com/kb/obs-studio-overview\">OBS Studio Overview</a>, or watch a \
<a href=\"https://obsproject.com/kb/obs-studio-quickstart-video\">video walkthrough</a>.",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::doc;

    const DIVIDER: &str = "------------------------------------------------";

    #[test]
    fn empty_log_gets_onboarding_pointer() {
        let out = scan_scenes(&doc(&["12:00: Startup complete"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "No Scenes/Sources");
    }

    #[test]
    fn live_added_sources_suppress_onboarding() {
        let out = scan_scenes(&doc(&["12:00: User added source 'Game Capture'"]));
        assert!(out.is_empty());
    }

    #[test]
    fn display_and_game_capture_in_one_scene() {
        let out = scan_scenes(&doc(&[
            "12:00: - scene 'Main':",
            "12:00:     - source: 'Display' (monitor_capture)",
            "12:00:     - source: 'Game' (game_capture)",
            DIVIDER,
        ]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Capture Interference");
    }

    #[test]
    fn clean_scene_produces_nothing() {
        let out = scan_scenes(&doc(&[
            "12:00: - scene 'Main':",
            "12:00:     - source: 'Cam' (dshow_input)",
            DIVIDER,
        ]));
        assert!(out.is_empty());
    }

    #[test]
    fn duplicate_scene_findings_collapse() {
        let out = scan_scenes(&doc(&[
            "12:00: - scene 'A':",
            "12:00:     - source: 'Display' (monitor_capture)",
            "12:00:     - source: 'Game' (game_capture)",
            "12:00: - scene 'B':",
            "12:00:     - source: 'Display' (monitor_capture)",
            "12:00:     - source: 'Game' (game_capture)",
            DIVIDER,
        ]));
        // Both scenes yield the identical finding set; it is kept once.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Capture Interference");
    }

    #[test]
    fn interference_in_one_of_two_sessions_reported_once() {
        let out = scan_scenes(&doc(&[
            "12:00: - scene 'Main':",
            "12:00:     - source: 'Display' (monitor_capture)",
            "12:00:     - source: 'Game' (game_capture)",
            DIVIDER,
            "13:00: - scene 'Main':",
            "13:00:     - source: 'Cam' (dshow_input)",
            DIVIDER,
        ]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Capture Interference");
    }

    #[test]
    fn violation_stops_accumulating_but_scan_completes() {
        let out = scan_scenes(&doc(&[
            "12:00: - scene 'Broken':",
            "12:00:     - source: 'Game1' (game_capture)",
            "12:00:     - source: 'Game2' (game_capture)",
            "12:00: - scene 'AlsoBad':",
            "12:00:     - source: 'Display' (monitor_capture)",
            "12:00:     - source: 'Game' (game_capture)",
            DIVIDER,
        ]));
        // The second scene's interference finding is discarded once the
        // first scene's game-capture violation has been recorded.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Multiple Game Capture");
    }

    #[test]
    fn last_scene_extends_to_next_section_divider() {
        let out = scan_scenes(&doc(&[
            "12:00: - scene 'Main':",
            "12:00:     - source: 'Display' (monitor_capture)",
            "12:00:     - source: 'Game' (game_capture)",
            DIVIDER,
            "12:00:     - source: 'Game2' (game_capture)",
        ]));
        // The game capture past the divider belongs to no scene.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Capture Interference");
    }

    #[test]
    fn browser_accel_disabled_vs_blacklisted() {
        use crate::report::Severity;
        let user = doc(&["12:00: Browser Hardware Acceleration: false"]);
        assert_eq!(browser_accel(&user).unwrap().severity, Severity::Warning);
        let driver = doc(&[
            "12:00: Browser Hardware Acceleration: false",
            "12:00: [obs-browser]: Blacklisted device detected, disabling browser source hardware acceleration",
        ]);
        assert_eq!(browser_accel(&driver).unwrap().severity, Severity::Info);
        assert_eq!(browser_accel(&doc(&["clean"])), None);
    }
}
