//! Encoder configuration and encoder-overload rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::fields::{peak_percent, FieldBlock};
use crate::report::{Finding, Severity};
use crate::rules::fmt_percent;
use crate::search::{find_all, find_all_indexed};

static UNKNOWN_ENCODER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Encoder ID '(?P<name>.+)' not found").unwrap());

/// Encoders removed in the macOS VideoToolbox rework; configs still
/// pointing at them need a manual fix.
const OUTDATED_MAC_ENCODERS: [&str; 2] = ["vt_h264_sw", "vt_h264_hw"];

pub fn mp4_recording(doc: &LogDocument) -> Option<Finding> {
    let written = find_all("Writing file ", doc.lines());
    let mp4 = written.iter().any(|l| l.contains(".mp4"));
    let mov = written.iter().any(|l| l.contains(".mov"));
    let fragmented =
        !find_all("movflags=frag_keyframe+empty_moov+delay_moov", doc.lines()).is_empty();
    if (mp4 || mov) && !fragmented {
        return Some(Finding::critical(
            "MP4/MOV Recording",
            "Record to FLV or MKV. If you record to MP4 or MOV and the recording is interrupted, \
the file will be corrupted and unrecoverable.<br><br>If you require MP4 files for some other \
purpose like editing, remux them afterwards by selecting File -> Remux Recordings in the main OBS \
Studio window.",
        ));
    }
    None
}

pub fn x264_preset(doc: &LogDocument) -> Option<Finding> {
    let encoder_lines = find_all("x264 encoder:", doc.lines());
    let presets = find_all("preset: ", doc.lines());
    let sensible = presets
        .iter()
        .all(|l| l.contains("veryfast") || l.contains("superfast") || l.contains("ultrafast"));
    if !encoder_lines.is_empty() && !sensible {
        return Some(Finding::info(
            "Non-Default x264 Preset",
            "A slower x264 preset than 'veryfast' is in use. It is recommended to leave this value \
on veryfast, as there are significant diminishing returns to setting it lower. It can also result \
in very poor gaming performance on the system if you're not using a 2 PC setup.",
        ));
    }
    None
}

pub fn custom_ffmpeg(doc: &LogDocument) -> Option<Finding> {
    if find_all("'adv_ffmpeg_output':", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Custom FFMPEG Output",
        "Custom FFMPEG output is in use. Only absolute professionals should use this. If you got \
your settings from a YouTube video advertising \"Absolute best OBS settings\" then we recommend \
using one of the presets in Simple output mode instead.",
    ))
}

/// Compare the configured stream bitrate against a resolution × frame
/// rate estimate. Fields come from the last stream-settings block;
/// resolution and frame rate fall back to the preceding video-settings
/// block. If the bitrate is absent, or the fallback also fails, the rule
/// declines rather than compute from partial data.
pub fn stream_bitrate(doc: &LogDocument) -> Option<Finding> {
    let anchors = find_all_indexed("stream'] settings:", doc.lines());
    let (_, anchor) = *anchors.last()?;
    let params = FieldBlock::scan(
        doc.lines(),
        anchor,
        &["bitrate", "height", "width", "fps_num", "fps_den"],
    );
    let bitrate = params.number("bitrate")?;

    let geometry = params.number("width").zip(params.number("height")).zip(
        params.number("fps_num").zip(params.number("fps_den")),
    );
    let ((width, height), (fps_num, fps_den)) = match geometry {
        Some(values) => values,
        None => {
            // Fallback anchor: the video settings dump preceding this block.
            let head = &doc.lines()[..params.end()];
            let videos = find_all_indexed("video settings reset:", head);
            let (_, video_anchor) = *videos.last()?;
            let video =
                FieldBlock::scan(doc.lines(), video_anchor, &["output resolution", "fps"]);
            (video.pair("output resolution", 'x')?, video.pair("fps", '/')?)
        }
    };
    if fps_den == 0.0 {
        return None;
    }

    let estimate = width * height * fps_num / fps_den / 20_000.0;
    if bitrate < estimate {
        return Some(Finding::info(
            "Low Stream Bitrate",
            "Your stream encoder is set to a video bitrate that is too low. This will lower picture \
quality especially in high motion scenes like fast paced games. Use the Auto-Config Wizard to \
adjust your settings to the optimum for your situation. It can be accessed from the Tools menu in \
OBS, and then just follow the on-screen directions.",
        ));
    }
    None
}

pub fn nvenc_start_failure(doc: &LogDocument) -> Option<Finding> {
    if find_all("Failed to open NVENC codec", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "NVENC Start Failure",
        "The NVENC Encoder failed to start due of a variety of possible reasons. Make sure that \
Windows Game Bar and Windows Game DVR are disabled and that your GPU drivers are up to date.<br><br>\
You can perform a clean driver installation for your GPU by following the instructions at \
<a href=\"http://obsproject.com/forum/resources/performing-a-clean-gpu-driver-installation.65/\">\
Clean GPU driver installation</a>.<br>If this doesn't solve the issue, then it's possible your \
graphics card doesn't support NVENC. You can change to a different Encoder in Settings -> Output.",
    ))
}

pub fn encode_error(doc: &LogDocument) -> Option<Finding> {
    if find_all("Error encoding with encoder", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Encoder start error",
        "An encoder failed to start. This could result in a bitrate stuck at 0 or OBS stuck on \
\"Stopping Recording\". Depending on your encoder, try updating your drivers. If you're using QSV, \
make sure your iGPU is enabled. If that still doesn't help, try switching to a different encoder \
in Settings -> Output.",
    ))
}

fn overload_severity(peak: f64) -> Severity {
    if peak >= 15.0 {
        Severity::Critical
    } else if peak >= 5.0 {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Skipped-frame percentage, attributed to CPU or GPU depending on which
/// encoder families appear in the log.
pub fn encoder_overload(doc: &LogDocument) -> Option<Finding> {
    let lines = doc.lines();
    let has_x264 = !find_all("[x264 encoder:", lines).is_empty();
    let has_hardware = !find_all("[jim-nvenc:", lines).is_empty()
        || !find_all("[NVENC encoder:", lines).is_empty()
        || !find_all("[AMF] [H264]", lines).is_empty()
        || !find_all("[AMF] [H265]", lines).is_empty()
        || !find_all("[qsv encoder:", lines).is_empty()
        || !find_all("[VideoToolbox recording_h264:", lines).is_empty()
        || !find_all("[VideoToolbox streaming_h264:", lines).is_empty();

    let drops = find_all("skipped frames", lines);
    let peak = peak_percent(&drops)?;
    let severity = overload_severity(peak);
    let val = fmt_percent(peak);

    let generic = Finding::new(
        severity,
        format!("{val}% Encoder Overload"),
        "Encoder overload may be related to your CPU or GPU being overloaded, depending on the \
encoder in question. If you are using a software encoder (x264) please see the \
<a href=\"https://obsproject.com/kb/encoding-performance-troubleshooting\">CPU Overload Guide</a>. \
If you are using a hardware encoder (AMF, QSV/Quicksync, NVENC) please see the \
<a href=\"https://obsproject.com/kb/encoding-performance-troubleshooting\">GPU Overload Guide</a>.",
    );

    Some(match (has_x264, has_hardware) {
        (true, true) => generic,
        (true, false) => Finding::new(
            severity,
            format!("{val}% CPU Encoder Overload"),
            "The encoder is skipping frames because of CPU overload. Read about \
<a href=\"https://obsproject.com/kb/encoding-performance-troubleshooting\">General Performance and \
Encoding Issues</a>.",
        ),
        (false, true) => Finding::new(
            severity,
            format!("{val}% GPU Encoder Overload"),
            "The encoder is skipping frames because of GPU overload. Read about troubleshooting \
tips in our <a href=\"https://obsproject.com/kb/encoding-performance-troubleshooting\">GPU \
Overload Guide</a>.",
        ),
        (false, false) => generic,
    })
}

pub fn unknown_encoder(doc: &LogDocument) -> Option<Finding> {
    for line in find_all("Encoder ID", doc.lines()) {
        let Some(caps) = UNKNOWN_ENCODER_RE.captures(line) else {
            continue;
        };
        let name = &caps["name"];
        if OUTDATED_MAC_ENCODERS.contains(&name) {
            return Some(Finding::critical(
                "Outdated Encoder Set",
                "In OBS v27, the Apple VT encoder was changed to better support the Apple M1 \
platform, which resulted in the existing encoder becoming unrecognised. Manually navigate to \
Settings -> Output and set the 'Encoder' to fix this.",
            ));
        }
        return Some(Finding::warning(
            "Unrecognised Encoder",
            "One of the configured encoders is not recognised. This can result in failure to go \
live or to record. To fix this, go to Settings -> Output and change the 'Encoder' option.",
        ));
    }
    None
}
