//! Gating rules, the OBS version precedence chain, and whole-log facts.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::report::{Finding, Severity};
use crate::rules::{html_escape, CLEAN_LOG};
use crate::search::{find_all, find_all_indexed};
use crate::sections::subsections;
use crate::CURRENT_VERSION;

/// Operating system fingerprint read from the head of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Mac,
    Windows,
    Linux,
}

/// Gate: OBS Classic logs are not diagnosable at all.
pub fn classic(doc: &LogDocument) -> (bool, Option<Finding>) {
    if find_all(": Open Broadcaster Software v0.", doc.lines()).is_empty() {
        return (false, None);
    }
    (
        true,
        Some(Finding::critical(
            "OBS Classic",
            "You are still using OBS Classic. This version is no longer supported. While we cannot and \
will not do anything to prevent you from using it, we cannot help with any issues that may come up.<br>\
It is recommended that you update to OBS Studio.<br><br>Further information on why you should update \
(and how): <a href=\"https://obsproject.com/forum/threads/how-to-easily-switch-to-obs-studio.55820/\">\
OBS Classic to OBS Studio</a>.",
        )),
    )
}

/// Gate: crash reports use a different format and are not runtime logs.
pub fn crash(doc: &LogDocument) -> (bool, Option<Finding>) {
    if find_all("Unhandled exception:", doc.lines()).is_empty() {
        return (false, None);
    }
    (
        true,
        Some(Finding::critical(
            "Crash Log",
            "You have uploaded a crash log. The Log Analyzer does not yet process crash logs.",
        )),
    )
}

pub fn two_instances(doc: &LogDocument) -> Option<Finding> {
    if find_all("Warning: OBS is already running!", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::critical(
        "Two Instances",
        "Two instances of OBS are running. If you are not intentionally running two instances, they \
will likely interfere with each other and consume excessive resources. Stop one of them. Check Task \
Manager for stray OBS processes if you can't find the other one.",
    ))
}

pub fn autoconfig(doc: &LogDocument) -> Option<Finding> {
    if find_all("Auto-config wizard", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::critical(
        "Auto-Config Wizard",
        format!(
            "The log contains an Auto-Config Wizard run. Results of this analysis are therefore \
inaccurate. Please post a link to a clean log file.{CLEAN_LOG}"
        ),
    ))
}

pub fn cpu_tier(doc: &LogDocument) -> Option<Finding> {
    let cpu = find_all("CPU Name", doc.lines());
    let first = cpu.first()?;
    if first.contains("APU") || first.contains("Pentium") || first.contains("Celeron") {
        return Some(Finding::critical(
            "Insufficient Hardware",
            "Your system is below minimum specs for OBS to run and may be too underpowered to \
livestream. There are no recommended settings we can suggest, but try the Auto-Config Wizard in the \
Tools menu. You may need to upgrade or replace your computer for a better experience.",
        ));
    }
    if first.contains("i3") {
        return Some(Finding::info(
            "Insufficient Hardware",
            "Your system is below minimum specs for OBS to run and is too underpowered to livestream \
using software encoding. Livestreams and recordings may run more smoothly if you are using a hardware \
encoder like QuickSync, NVENC or AMF (via Settings -> Output).",
        ));
    }
    None
}

pub fn portable_mode(doc: &LogDocument) -> Option<Finding> {
    if find_all("Portable mode: true", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Portable Mode",
        "You are running OBS in Portable Mode. This means that OBS will store its settings with the \
executable. This is useful if you want to run OBS from a flash drive or other removable media.",
    ))
}

static SAFE_MODE_MODULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").unwrap());

pub fn safe_mode(doc: &LogDocument) -> Option<Finding> {
    if find_all("Safe Mode enabled.", doc.lines()).is_empty() {
        return None;
    }
    let names: Vec<String> = find_all("not on safe list", doc.lines())
        .iter()
        .filter_map(|line| SAFE_MODE_MODULE_RE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect();

    if names.is_empty() {
        return Some(Finding::warning(
            "Safe Mode Enabled",
            "You are running OBS in Safe Mode. Safe Mode disables third-party plugins and prevents \
scripts from running.",
        ));
    }
    let list: String = names
        .iter()
        .map(|n| format!("<li>{n}</li>\n"))
        .collect();
    Some(Finding::warning(
        format!("Safe Mode Enabled ({})", names.len()),
        format!(
            "You are running OBS in Safe Mode. Safe Mode disables third-party plugins and prevents \
scripts from running. The following modules were not loaded:<br>\n<ul>\n{list}</ul>"
        ),
    ))
}

/// Read the OS fingerprint from the portion of the log preceding the
/// first subsection divider. The platform tag on the version line
/// ("(64 bit, windows)") is what makes the lowercase match land.
pub fn detect_os(doc: &LogDocument) -> Option<Os> {
    let bounds = subsections(doc.lines());
    let head = &doc.lines()[..*bounds.first()?];
    for line in head {
        if line.contains("mac") {
            return Some(Os::Mac);
        } else if line.contains("windows") {
            return Some(Os::Windows);
        } else if line.contains("linux") {
            return Some(Os::Linux);
        }
    }
    None
}

// ─── OBS version precedence chain ────────────────────────────

static OBS_VERSION_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r": OBS \d+\.\d+\.\d+").unwrap());

static OBS_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<micro>\d+)(-(?P<special>(?P<special_type>rc|beta)\d*))?$",
    )
    .unwrap()
});

static UNOFFICIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\+[\w\-.~+]+").unwrap());
static CAFFEINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\w+-caffeine").unwrap());
static CUSTOM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+-[\d-]*[a-z0-9]+(-modified)?").unwrap());

/// Pre-release phase, ordered the way release versioning orders them:
/// any beta sorts before any release candidate, which sorts before the
/// final release of the same triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Beta(u32),
    Rc(u32),
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ObsVersion {
    major: u32,
    minor: u32,
    micro: u32,
    phase: Phase,
}

impl ObsVersion {
    fn parse(raw: &str) -> Option<Self> {
        let caps = OBS_VERSION_RE.captures(raw)?;
        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse().ok());
        let phase = match caps.name("special_type").map(|m| m.as_str().to_lowercase()) {
            None => Phase::Release,
            Some(kind) => {
                let n: u32 = caps
                    .name("special")
                    .map(|m| m.as_str())
                    .and_then(|s| s[kind.len()..].parse().ok())
                    .unwrap_or(0);
                if kind == "rc" {
                    Phase::Rc(n)
                } else {
                    Phase::Beta(n)
                }
            }
        };
        Some(Self {
            major: number("major")?,
            minor: number("minor")?,
            micro: number("micro")?,
            phase,
        })
    }

    fn is_prerelease(&self) -> bool {
        self.phase != Phase::Release
    }
}

impl Ord for ObsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.micro, self.phase)
            .cmp(&(other.major, other.minor, other.micro, other.phase))
    }
}

impl PartialOrd for ObsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The line carrying the OBS version: prefer the canonical
/// `: OBS x.y.z` shape, otherwise fall back to the last line
/// mentioning OBS at all.
fn obs_version_line<'a>(doc: &'a LogDocument) -> Option<&'a str> {
    let candidates = find_all("OBS", doc.lines());
    candidates
        .iter()
        .copied()
        .find(|l| OBS_VERSION_LINE_RE.is_match(l))
        .or_else(|| candidates.last().copied())
}

fn obs_version_string(doc: &LogDocument) -> Option<&str> {
    let line = obs_version_line(doc)?;
    let tail = &line[line.find("OBS")?..];
    tail.split_whitespace().nth(1)
}

/// The version precedence chain. A specific broken release beats the
/// generic old-version check; unparsable builds are classified before
/// any age comparison is attempted.
pub fn obs_version(doc: &LogDocument) -> Option<Finding> {
    let raw = obs_version_string(doc)?;

    if ObsVersion::parse(raw) == ObsVersion::parse("21.1.0") {
        return Some(Finding::warning(
            "Broken Auto-Update",
            "You are not running the latest version of OBS Studio. Automatic updates in version \
21.1.0 are broken due to a bug.<br>Please update by downloading the latest installer from the \
<a href=\"https://obsproject.com/download\">downloads page</a> and running it.",
        ));
    }

    let normalized = raw.replace("-modified", "");
    let parsed = ObsVersion::parse(&normalized);

    if parsed.is_none() {
        let escaped = html_escape(raw);
        if UNOFFICIAL_RE.is_match(raw) {
            return Some(Finding::info(
                format!("Unofficial OBS Build ({escaped})"),
                format!(
                    "Your OBS version identifies itself as '{escaped}', which is not an official \
build.<br>If you are on Linux, ensure you're using the PPA. If you cannot switch to the PPA, contact \
the maintainer of the package for any support issues."
                ),
            ));
        }
        if CAFFEINE_RE.is_match(raw) {
            return Some(Finding::info(
                format!("Third party OBS Version ({escaped})"),
                format!(
                    "Your OBS version identifies itself as '{escaped}', which is made by a third \
party. Contact them for any support issues."
                ),
            ));
        }
        if CUSTOM_RE.is_match(raw) {
            return Some(Finding::info(
                format!("Custom OBS Build ({escaped})"),
                format!(
                    "Your OBS version identifies itself as '{escaped}', which is not a released OBS \
version."
                ),
            ));
        }
        return Some(Finding::info(
            format!("Unparseable OBS Version ({escaped})"),
            format!(
                "Your OBS version identifies itself as '{escaped}', which cannot be parsed as a \
valid OBS version number."
            ),
        ));
    }

    let parsed = parsed?;
    if parsed.is_prerelease() {
        let escaped = html_escape(raw);
        let (label, kind) = match parsed.phase {
            Phase::Beta(_) => ("Beta OBS Version", "beta"),
            Phase::Rc(_) => ("Release Candidate OBS Version", "release candidate"),
            Phase::Release => unreachable!(),
        };
        return Some(Finding::info(
            format!("{label} ({escaped})"),
            format!(
                "You are running a {kind} version of OBS. There is nothing wrong with this, but you \
may experience problems that you may not experience with fully released OBS versions. You are \
encouraged to upgrade to a released version of OBS as soon as one is available."
            ),
        ));
    }

    let current = ObsVersion::parse(CURRENT_VERSION)?;
    if parsed < current {
        let escaped = html_escape(raw);
        return Some(Finding::warning(
            format!("Old Version ({escaped})"),
            format!(
                "You are running an old version of OBS Studio ({escaped}) Please update to version \
{} by going to Help -> Check for updates in OBS or by downloading the latest installer from the \
<a href=\"https://obsproject.com/download\">downloads page</a> and running it.",
                html_escape(CURRENT_VERSION)
            ),
        ));
    }
    None
}

/// There should be at least one output session in a useful log.
pub fn output_attempt(doc: &LogDocument) -> Option<Finding> {
    let recording = find_all_indexed("== Recording Start ==", doc.lines());
    let streaming = find_all_indexed("== Streaming Start ==", doc.lines());
    let replay = find_all_indexed("== Replay Buffer Start ==", doc.lines());
    if recording.len() + streaming.len() + replay.len() > 0 {
        return None;
    }
    Some(Finding::info(
        "No Output Session",
        format!(
            "Your log contains no recording or streaming session. Results of this log analysis are \
limited. Please post a link to a clean log file.{CLEAN_LOG}"
        ),
    ))
}
