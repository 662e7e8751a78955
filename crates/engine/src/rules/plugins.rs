//! Third-party plugin detection: load conflicts and the loaded-module
//! inventory.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::report::Finding;
use crate::rules::core::{detect_os, Os};
use crate::rules::html_escape;
use crate::search::{find_all, find_all_indexed};

static CONFLICT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/(?P<plugin>[^/]+)' due to possible import conflicts").unwrap());

/// Modules that ship with OBS on every platform.
const COMMON_MODULES: [&str; 22] = [
    "frontend-tools",
    "vlc-video",
    "obs-outputs",
    "obs-vst",
    "obs-ffmpeg",
    "obs-browser",
    "obs-transitions",
    "decklink",
    "decklink-captions",
    "text-freetype2",
    "decklink-output-ui",
    "decklink-ouput-ui",
    "aja",
    "aja-output-ui",
    "obs-x264",
    "obs-websocket",
    "obs-filters",
    "image-source",
    "rtmp-services",
    "obs-webrtc",
    "obs-nvenc",
    "nv-filters",
];

const WINDOWS_MODULES: [&str; 9] = [
    "win-wasapi",
    "win-mf",
    "win-dshow",
    "win-capture",
    "obs-text",
    "obs-qsv11",
    "win-decklink",
    "enc-amf",
    "coreaudio-encoder",
];

const MAC_MODULES: [&str; 7] = [
    "mac-virtualcam",
    "mac-videotoolbox",
    "mac-syphon",
    "mac-capture",
    "mac-avcapture",
    "coreaudio-encoder",
    "mac-avcapture-legacy",
];

const LINUX_MODULES: [&str; 8] = [
    "obs-libfdk",
    "linux-v4l2",
    "linux-pulseaudio",
    "linux-pipewire",
    "linux-jack",
    "linux-capture",
    "linux-alsa",
    "obs-qsv11",
];

/// Plugins refused at load time because a newer copy of a shared library
/// was already mapped. These are all but guaranteed to be outdated builds.
pub fn import_conflicts(doc: &LogDocument) -> Option<Finding> {
    let hits = find_all("due to possible import conflicts", doc.lines());
    if hits.is_empty() {
        return None;
    }
    let mut items = String::new();
    for line in &hits {
        if let Some(caps) = CONFLICT_RE.captures(line) {
            let plugin = caps["plugin"].trim_end_matches(".dll");
            items.push_str(&format!("<li>{}</li>", html_escape(plugin)));
        }
    }
    Some(Finding::critical(
        format!("Outdated Plugins ({})", hits.len()),
        format!(
            "The following plugins were not loaded because they are outdated and conflict with \
current versions of OBS libraries:<br><ul>{items}</ul>Check for updated versions on the \
<a href=\"https://obsproject.com/forum/resources/\">OBS forums</a> or remove them. See also: \
<a href=\"https://obsproject.com/kb/plugins-guide\">Plugin Compatibility Guide</a>."
        ),
    ))
}

/// Inventory the loaded-module list and report everything that is not a
/// stock module for the detected platform. Without an OS fingerprint the
/// stock set is unknown, so the rule declines.
pub fn plugin_list(doc: &LogDocument) -> Option<Finding> {
    let os = detect_os(doc)?;
    let anchors = find_all_indexed("Loaded Modules:", doc.lines());
    let (_, anchor) = *anchors.first()?;

    let stock: Vec<&str> = match os {
        Os::Windows => COMMON_MODULES.iter().chain(WINDOWS_MODULES.iter()),
        Os::Mac => COMMON_MODULES.iter().chain(MAC_MODULES.iter()),
        Os::Linux => COMMON_MODULES.iter().chain(LINUX_MODULES.iter()),
    }
    .copied()
    .collect();

    let mut third_party: Vec<String> = Vec::new();
    for line in &doc.lines()[anchor + 1..] {
        // Module entries are deeply indented under the header.
        if !line.contains("     ") {
            break;
        }
        let entry = line.split(": ").nth(1).unwrap_or(line.as_str()).trim();
        // Drop the platform extension (.dll, .so, .dylib).
        let name = entry
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(entry)
            .to_string();
        if !stock.contains(&name.as_str()) && !third_party.contains(&name) {
            third_party.push(name);
        }
    }
    if third_party.is_empty() {
        return None;
    }
    third_party.sort();

    let items: String = third_party
        .iter()
        .map(|p| format!("<li>{}</li>", html_escape(p)))
        .collect();
    Some(Finding::info(
        format!("Third-Party Plugins ({})", third_party.len()),
        format!(
            "You have third-party plugins installed:<br><ul>{items}</ul>If you are experiencing \
issues, try uninstalling them one by one to find the culprit. Keep them updated; outdated plugins \
are a common source of crashes and source glitches."
        ),
    ))
}
