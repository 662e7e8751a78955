//! Windows environment rules: elevation, Game DVR/Mode, GPU scheduling
//! and driver sanity.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::report::Finding;
use crate::search::find_all;

static WASAPI_RATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+) Hz\]").unwrap());

pub fn admin_rights(doc: &LogDocument) -> Option<Finding> {
    if find_all("Running as administrator: false", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Not Admin",
        "OBS is not running as Administrator. Game Capture may fail to hook games that run \
elevated, and the high-priority process option is unavailable. If you run into either issue, \
right-click OBS and choose \"Run as administrator\".",
    ))
}

pub fn game_dvr(doc: &LogDocument) -> Option<Finding> {
    if find_all("Game DVR: On", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Game DVR",
        "Windows Game DVR is enabled. It records gameplay in the background and is known to \
conflict with Game Capture and with hardware encoding. Disable it in Windows Settings -> Gaming \
-> Captures.",
    ))
}

pub fn game_mode(doc: &LogDocument) -> Option<Finding> {
    if find_all("Game Mode: On", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Game Mode",
        "Windows Game Mode is enabled. It prioritizes the game over background applications, \
which can starve OBS of CPU and GPU time and cause encoding or rendering lag. If you see such \
lag, disable it in Windows Settings -> Gaming -> Game Mode.",
    ))
}

pub fn hardware_gpu_scheduler(doc: &LogDocument) -> Option<Finding> {
    if find_all("Hardware GPU Scheduler: On", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Hardware-accelerated GPU Scheduler",
        "Hardware-accelerated GPU scheduling is enabled. This Windows feature is known to cause \
rendering lag and capture performance issues in OBS. Disable it in Windows Settings -> System -> \
Display -> Graphics -> Change default graphics settings, then restart the PC.",
    ))
}

/// The Microsoft Basic Render Driver is a CPU rasterizer; OBS landing on
/// it means no usable GPU driver is installed or the wrong adapter was
/// picked.
pub fn software_rasterizer(doc: &LogDocument) -> Option<Finding> {
    if find_all("Microsoft Basic Render Driver", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::critical(
        "Software Rasterizer",
        "OBS is running on the Microsoft Basic Render Driver, a software rasterizer with no GPU \
acceleration. Performance will be extremely poor and hardware encoders are unavailable. Install \
the proper drivers for your graphics card, and if you have multiple GPUs make sure OBS runs on \
the correct one.",
    ))
}

/// 32-bit OBS on 64-bit Windows caps usable memory and drops plugin
/// compatibility.
pub fn bit32_on_64bit(doc: &LogDocument) -> Option<Finding> {
    let win64 = find_all("Windows Version:", doc.lines())
        .iter()
        .any(|l| l.contains("64-bit"));
    let obs32 = find_all(": OBS", doc.lines())
        .iter()
        .any(|l| l.contains("(32 bit"));
    if !(win64 && obs32) {
        return None;
    }
    Some(Finding::warning(
        "32-bit OBS on 64-bit Windows",
        "You are running the 32-bit version of OBS on a 64-bit system. This limits available \
memory and may crash with many sources or browser sources in use. Uninstall it and install the \
64-bit version from <a href=\"https://obsproject.com/download\">the OBS website</a>.",
    ))
}

pub fn geforce_940(doc: &LogDocument) -> Option<Finding> {
    let adapter_940 = find_all("Loading up D3D11 on adapter", doc.lines())
        .iter()
        .any(|l| l.contains("940"));
    if !adapter_940 {
        return None;
    }
    Some(Finding::warning(
        "Laptop GPU (GeForce 900M series)",
        "OBS is rendering on a GeForce 900M-series laptop GPU. These chips struggle with encoding \
and rendering simultaneously. Lower the output resolution and frame rate, and prefer the \
integrated GPU's QuickSync encoder if available.",
    ))
}

/// OBS only logs this warning on Windows, where the OpenGL backend lacks
/// the capture optimizations of the Direct3D 11 renderer.
pub fn opengl_on_windows(doc: &LogDocument) -> Option<Finding> {
    if find_all(
        "Warning: The OpenGL renderer is an experimental feature",
        doc.lines(),
    )
    .is_empty()
    {
        return None;
    }
    Some(Finding::critical(
        "OpenGL Renderer",
        "OBS is using the OpenGL renderer on Windows. It is experimental there, performs \
significantly worse than Direct3D 11 and breaks Game Capture. Switch the renderer back to \
Direct3D 11 in Settings -> Advanced -> Video.",
    ))
}

/// WASAPI devices negotiating different sample rates cause resampling
/// drift and crackling audio.
pub fn wasapi_sample_rates(doc: &LogDocument) -> Option<Finding> {
    let rates: HashSet<&str> = find_all("WASAPI: Device", doc.lines())
        .iter()
        .filter_map(|l| WASAPI_RATE_RE.captures(l))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    if rates.len() <= 1 {
        return None;
    }
    Some(Finding::warning(
        "Mismatched Sample Rates",
        "Your audio devices use different sample rates. This forces constant resampling and can \
cause audio crackling or drift. Open the Windows sound control panel and set every capture and \
playback device used in OBS to the same sample rate, commonly 48000 Hz.",
    ))
}
