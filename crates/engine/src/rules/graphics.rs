//! Renderer and GPU driver rules, plus the canonical video settings audit.

use crate::document::LogDocument;
use crate::fields::{peak_percent, FieldBlock};
use crate::report::{Finding, Severity};
use crate::rules::fmt_percent;
use crate::search::{find_all, find_all_indexed};

pub fn init_failed(doc: &LogDocument) -> Option<Finding> {
    if find_all("Failed to initialize video", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::critical(
        "Initialize Failed",
        "Failed to initialize video. Your GPU may not be supported, or your graphics drivers may \
need to be updated.",
    ))
}

fn lag_severity(peak: f64) -> Severity {
    if peak >= 10.0 {
        Severity::Critical
    } else if peak >= 3.0 {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Frames missed due to rendering lag, reported at the worst percentage
/// seen across all output summaries.
pub fn render_lag(doc: &LogDocument) -> Option<Finding> {
    let hits = find_all("rendering lag", doc.lines());
    let peak = peak_percent(&hits)?;
    Some(Finding::new(
        lag_severity(peak),
        format!("{}% Rendering Lag", fmt_percent(peak)),
        "Your GPU is maxed out and OBS can't render scenes fast enough. Running a game without \
vertical sync or a frame rate limiter will frequently cause performance issues with OBS because \
your GPU will be maxed out. Enable vsync or set a reasonable frame rate limit that your GPU can \
handle without hitting 100% usage.<br><br>If that's not enough you may also need to turn down some \
of the video quality options in the game. If you are experiencing issues in general while using \
OBS, your GPU may be overloaded for the settings you are trying to use.<br><br>Please check our \
guide for ideas why this may be happening, and steps you can take to correct it: \
<a href=\"https://obsproject.com/wiki/GPU-overload-issues\">GPU Overload Issues</a>.",
    ))
}

pub fn amd_drivers(doc: &LogDocument) -> Option<Finding> {
    if find_all("The AMF Runtime is very old and unsupported", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "AMD Drivers",
        "The AMF Runtime is very old and unsupported. The AMF encoder will not work properly or at \
all. Consider updating your drivers from \
<a href=\"https://support.amd.com/en-us/download\">AMD's website</a>.",
    ))
}

pub fn nvidia_drivers(doc: &LogDocument) -> Option<Finding> {
    let outdated = !find_all(
        "[jim-nvenc] Current driver version does not support this NVENC version, please upgrade your driver",
        doc.lines(),
    )
    .is_empty()
        || !find_all("[NVENC] Test process failed: outdated_driver", doc.lines()).is_empty();
    if !outdated {
        return None;
    }
    Some(Finding::warning(
        "Old NVIDIA Drivers",
        "The installed NVIDIA driver does not support NVENC features needed for optimized \
encoding. Please update your drivers by following this guide: \
<a href=\"https://obsproject.com/kb/gpu-drivers\">GPU Driver Update Guide</a>.",
    ))
}

/// Legacy 390-series drivers under EGL report OpenGL 3.3.0; NVENC and
/// window capture both misbehave there.
pub fn nvidia_egl(doc: &LogDocument) -> Option<Finding> {
    if find_all("Using EGL/X11", doc.lines()).is_empty() {
        return None;
    }
    if find_all(
        "OpenGL loaded successfully, version 3.3.0 NVIDIA 390",
        doc.lines(),
    )
    .is_empty()
    {
        return None;
    }
    Some(Finding::warning(
        "Old NVIDIA Drivers",
        "The legacy 390 driver series does not support the EGL platform properly. Window capture \
will not work and OBS may fail to start. Switch to X11/GLX or update to a supported driver \
series.",
    ))
}

/// Audit the canonical video settings block. Emits independent findings
/// for color range, color format, aspect ratio and frame rate; parse
/// failures truncate the audit at whatever was established so far.
pub fn video_settings(doc: &LogDocument) -> Vec<Finding> {
    let mut findings = Vec::new();
    let anchors = find_all_indexed("video settings reset:", doc.lines());
    let Some(&(_, anchor)) = anchors.last() else {
        return findings;
    };
    let block = FieldBlock::scan(
        doc.lines(),
        anchor,
        &["base resolution", "output resolution", "fps", "format", "YUV mode"],
    );

    if block.raw("YUV mode").is_some_and(|v| v.contains("Full")) {
        findings.push(Finding::warning(
            "Wrong Color Range",
            "Having the color range set to \"Full\" will cause playback issues in certain browsers \
and on various video platforms. Shadows, highlights and color will look off. In OBS, go to \
Settings -> Advanced and set \"Color Range\" back to \"Limited\".",
        ));
    }
    if block
        .raw("format")
        .is_some_and(|v| v != "NV12" && v != "P010")
    {
        findings.push(Finding::critical(
            "Wrong Color Format",
            "Color formats other than NV12 and P010 are primarily intended for recording, and are \
not recommended when streaming. Streaming may incur increased CPU usage due to color format \
conversion. In OBS, go to Settings -> Advanced and set \"Color Format\" back to \"NV12\".",
        ));
    }

    let Some((base_w, base_h)) = block.pair("base resolution", 'x') else {
        return findings;
    };
    let Some((out_w, out_h)) = block.pair("output resolution", 'x') else {
        return findings;
    };
    let Some((fps_num, fps_den)) = block.pair("fps", '/') else {
        return findings;
    };
    if base_h == 0.0 || out_h == 0.0 || fps_den == 0.0 {
        return findings;
    }

    let base_aspect = base_w / base_h;
    let out_aspect = out_w / out_h;
    let widescreen = |aspect: f64| aspect > 1.77 && aspect < 1.7787;
    if !widescreen(base_aspect) || !widescreen(out_aspect) {
        findings.push(Finding::warning(
            "Non-Standard Aspect Ratio",
            "Almost all modern streaming services and video platforms expect video in 16:9 aspect \
ratio. OBS is currently configured to record in an aspect ratio that differs from that. You (or \
your viewers) will see black bars during playback. Go to Settings -> Video and adjust your Canvas \
Resolution to one with a 16:9 aspect ratio.",
        ));
    }

    let fps = fps_num / fps_den;
    if fps != 30.0 && fps != 60.0 {
        findings.push(Finding::warning(
            "Non-Standard Framerate",
            "Framerates other than 30fps or 60fps may lead to playback issues like stuttering or \
screen tearing. Stick to either of these for better compatibility with video players. You can \
change your OBS frame rate in Settings -> Video.",
        ));
    }
    if fps >= 144.0 {
        findings.push(Finding::warning(
            "Excessively High Framerate",
            "Recording at a tremendously high framerate will not give you higher quality \
recordings. Usually quite the opposite. Most computers cannot handle encoding at high framerates. \
Try recording at 60fps instead.",
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::doc;

    fn settings_doc(format: &str, yuv: &str, base: &str, out: &str, fps: &str) -> crate::LogDocument {
        doc(&[
            "12:00: ---------------------------------",
            "12:00: video settings reset:",
            &format!("12:00: \tbase resolution:   {base}"),
            &format!("12:00: \toutput resolution: {out}"),
            "12:00: \tdownscale filter:  Bicubic",
            &format!("12:00: \tfps:               {fps}"),
            &format!("12:00: \tformat:            {format}"),
            &format!("12:00: \tYUV mode:          {yuv}"),
        ])
    }

    #[test]
    fn standard_settings_are_clean() {
        let d = settings_doc("NV12", "Rec. 709/Partial", "1920x1080", "1280x720", "60/1");
        assert!(video_settings(&d).is_empty());
    }

    #[test]
    fn full_range_and_format_flagged_independently() {
        let d = settings_doc("I444", "Rec. 709/Full", "1920x1080", "1920x1080", "30/1");
        let findings = video_settings(&d);
        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Wrong Color Range", "Wrong Color Format"]);
    }

    #[test]
    fn p010_format_is_accepted() {
        let d = settings_doc("P010", "Rec. 2100 (PQ)/Partial", "1920x1080", "1920x1080", "60/1");
        assert!(video_settings(&d).is_empty());
    }

    #[test]
    fn square_canvas_is_non_standard_aspect() {
        let d = settings_doc("NV12", "Rec. 709/Partial", "1080x1080", "1080x1080", "30/1");
        let findings = video_settings(&d);
        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Non-Standard Aspect Ratio"]);
    }

    #[test]
    fn odd_and_extreme_framerates_stack() {
        let d = settings_doc("NV12", "Rec. 709/Partial", "1920x1080", "1920x1080", "144/1");
        let findings = video_settings(&d);
        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Non-Standard Framerate", "Excessively High Framerate"]
        );
    }

    #[test]
    fn unparsable_resolution_truncates_audit() {
        let d = settings_doc("I444", "Rec. 709/Partial", "garbage", "1920x1080", "24/1");
        // Format finding was established before the parse failure, framerate
        // checks never ran.
        let findings = video_settings(&d);
        let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Wrong Color Format"]);
    }

    #[test]
    fn no_settings_block_is_clean() {
        assert!(video_settings(&doc(&["just a line"])).is_empty());
    }

    // ─── Lag and drivers ─────────────────────────────────────

    #[test]
    fn render_lag_tiers() {
        assert_eq!(lag_severity(10.0), Severity::Critical);
        assert_eq!(lag_severity(9.9), Severity::Warning);
        assert_eq!(lag_severity(3.0), Severity::Warning);
        assert_eq!(lag_severity(2.9), Severity::Info);
    }

    #[test]
    fn render_lag_uses_peak_percentage() {
        let d = doc(&[
            "12:00: Output 'a': Number of lagged frames due to rendering lag/stalls: 12 (0.6%)",
            "12:00: Output 'b': Number of lagged frames due to rendering lag/stalls: 312 (11.3%)",
        ]);
        let f = render_lag(&d).unwrap();
        assert_eq!(f.title, "11.3% Rendering Lag");
        assert_eq!(f.severity, Severity::Critical);
    }

    #[test]
    fn no_lag_lines_no_finding() {
        assert_eq!(render_lag(&doc(&["quiet log"])), None);
    }

    #[test]
    fn egl_390_needs_both_markers() {
        let both = doc(&[
            "12:00: Using EGL/X11",
            "12:00: OpenGL loaded successfully, version 3.3.0 NVIDIA 390.157",
        ]);
        assert!(nvidia_egl(&both).is_some());
        let glx_only = doc(&["12:00: OpenGL loaded successfully, version 3.3.0 NVIDIA 390.157"]);
        assert_eq!(nvidia_egl(&glx_only), None);
    }

    #[test]
    fn nvenc_driver_too_old() {
        let d = doc(&["12:00: [NVENC] Test process failed: outdated_driver"]);
        assert_eq!(nvidia_drivers(&d).unwrap().title, "Old NVIDIA Drivers");
    }
}
