//! macOS rules: OS support status, Rosetta, capture permissions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::report::Finding;
use crate::search::find_all;

static MAC_VER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<major>\d+)\.(?P<minor>\d+)").unwrap());

static PERMISSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Permission for (.+) denied").unwrap());

struct MacRelease {
    name: &'static str,
    /// Final release of the 10.x line; always end-of-life by now.
    eol: bool,
    /// Still receiving updates from Apple.
    latest: bool,
}

fn release_for(major: u32, minor: u32) -> Option<MacRelease> {
    let rel = |name, eol, latest| MacRelease { name, eol, latest };
    Some(match (major, minor) {
        (10, 13) => rel("High Sierra", true, false),
        (10, 14) => rel("Mojave", true, false),
        (10, 15) => rel("Catalina", true, false),
        (11, _) => rel("Big Sur", false, false),
        (12, _) => rel("Monterey", false, false),
        (13, _) => rel("Ventura", false, true),
        (14, _) => rel("Sonoma", false, true),
        (15, _) => rel("Sequoia", false, true),
        _ => return None,
    })
}

/// Report the macOS release and its support status.
pub fn macos_version(doc: &LogDocument) -> Option<Finding> {
    let lines = doc.lines();
    if find_all("OS Name: Mac OS X", lines).is_empty()
        && find_all("OS Name: macOS", lines).is_empty()
    {
        return None;
    }
    let version_line = find_all("OS Version:", lines).first().copied()?;
    let caps = MAC_VER_RE.captures(version_line)?;
    let major: u32 = caps["major"].parse().ok()?;
    let minor: u32 = caps["minor"].parse().ok()?;
    let release = release_for(major, minor)?;

    let version = if major <= 10 {
        format!("{major}.{minor}")
    } else {
        format!("{major}")
    };
    if major <= 10 && release.eol {
        return Some(Finding::warning(
            format!("macOS {version} (EOL)"),
            format!(
                "You are running macOS {version} ({name}), which is no longer supported by Apple. \
Newer versions of OBS no longer support this release, so you will be stuck on an old OBS version \
with known issues. Upgrade macOS to keep receiving OBS updates.",
                name = release.name
            ),
        ));
    }
    if release.latest {
        return Some(Finding::info(
            format!("macOS {version} (OK)"),
            format!(
                "You are running macOS {version} ({name}), which is supported by Apple and fully \
compatible with current versions of OBS.",
                name = release.name
            ),
        ));
    }
    Some(Finding::info(
        format!("macOS {version} (OK)"),
        format!(
            "You are running macOS {version} ({name}). While no longer updated by Apple, it is \
still compatible with current versions of OBS.",
            name = release.name
        ),
    ))
}

/// Intel build running through Rosetta on Apple Silicon wastes most of
/// the machine; VideoToolbox hardware encoding is unavailable there.
pub fn rosetta(doc: &LogDocument) -> Option<Finding> {
    if find_all("Rosetta translation used: true", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Intel OBS on Apple Silicon Mac",
        "You are running the Intel version of OBS through Rosetta on an Apple Silicon Mac. \
Performance is significantly reduced and hardware encoding is unavailable. Download the Apple \
Silicon build from <a href=\"https://obsproject.com/download\">the OBS website</a>.",
    ))
}

fn permission_description(name: &str) -> (&'static str, &'static str) {
    match name {
        "Audio Device Access" => (
            "Microphone",
            "microphones and other audio capture devices will not work",
        ),
        "Video Device Access" => (
            "Camera",
            "webcams and other video capture devices will not work",
        ),
        "Accessibility" => ("Accessibility", "hotkeys will not work while other apps are focused"),
        "Screen Capture" => (
            "Screen Capture",
            "display and window capture will show nothing",
        ),
        _ => ("Unknown", "the related capture features will not work"),
    }
}

/// Collect denied macOS permissions into one finding, each named once.
pub fn permissions(doc: &LogDocument) -> Option<Finding> {
    let mut denied: Vec<&str> = Vec::new();
    for line in find_all("[macOS] Permission for", doc.lines()) {
        if !line.contains("denied") {
            continue;
        }
        let Some(caps) = PERMISSION_RE.captures(line) else {
            continue;
        };
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !denied.contains(&name) {
            denied.push(name);
        }
    }
    if denied.is_empty() {
        return None;
    }
    denied.sort();

    let items: String = denied
        .iter()
        .map(|name| {
            let (label, effect) = permission_description(name);
            format!("<li><strong>{label}</strong>: {effect}</li>")
        })
        .collect();
    Some(Finding::warning(
        format!("Permissions Not Granted ({})", denied.len()),
        format!(
            "OBS was denied the following macOS permissions:<br><ul>{items}</ul>Grant them in \
System Settings -> Privacy &amp; Security, then restart OBS."
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use crate::rules::doc;

    fn mac_doc(version: &str) -> crate::LogDocument {
        doc(&[
            "12:00: OS Name: macOS",
            &format!("12:00: OS Version: {version}"),
        ])
    }

    #[test]
    fn high_sierra_is_eol() {
        let f = macos_version(&mac_doc("10.13.6")).unwrap();
        assert_eq!(f.title, "macOS 10.13 (EOL)");
        assert_eq!(f.severity, Severity::Warning);
    }

    #[test]
    fn sonoma_is_current() {
        let f = macos_version(&mac_doc("14.5")).unwrap();
        assert_eq!(f.title, "macOS 14 (OK)");
        assert!(f.detail.contains("supported by Apple"));
    }

    #[test]
    fn monterey_is_compatible_but_unsupported() {
        let f = macos_version(&mac_doc("12.7")).unwrap();
        assert_eq!(f.title, "macOS 12 (OK)");
        assert!(f.detail.contains("no longer updated by Apple"));
    }

    #[test]
    fn unknown_release_declines() {
        assert_eq!(macos_version(&mac_doc("10.9.5")), None);
    }

    #[test]
    fn non_mac_log_declines() {
        let d = doc(&["12:00: OS Version: 10.13.6"]);
        assert_eq!(macos_version(&d), None);
    }

    #[test]
    fn rosetta_translation_flagged() {
        let d = doc(&["12:00: Rosetta translation used: true"]);
        assert!(rosetta(&d).is_some());
        let native = doc(&["12:00: Rosetta translation used: false"]);
        assert_eq!(rosetta(&native), None);
    }

    #[test]
    fn denied_permissions_deduplicated_and_sorted() {
        let d = doc(&[
            "12:00: [macOS] Permission for Screen Capture denied",
            "12:00: [macOS] Permission for Audio Device Access denied",
            "12:00: [macOS] Permission for Screen Capture denied",
            "12:00: [macOS] Permission for Accessibility granted",
        ]);
        let f = permissions(&d).unwrap();
        assert_eq!(f.title, "Permissions Not Granted (2)");
        let mic = f.detail.find("Microphone").unwrap();
        let screen = f.detail.find("Screen Capture").unwrap();
        assert!(mic < screen);
    }

    #[test]
    fn granted_permissions_are_clean() {
        let d = doc(&["12:00: [macOS] Permission for Screen Capture granted"]);
        assert_eq!(permissions(&d), None);
    }
}
