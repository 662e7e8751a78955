//! The rule catalog: which rules run, and in what order.
//!
//! Two rule classes exist. Gating rules run first and may halt the whole
//! analysis (a halted log is not a diagnosable runtime log, so nothing
//! else is worth reporting). Independent rules are pure and order-free in
//! semantics; the catalog order only fixes the presentation order of
//! findings inside each severity bucket.

use crate::document::LogDocument;
use crate::report::Finding;
use crate::rules::{audio, core, encoding, graphics, linux, macos, network, plugins, sources, windows};

/// A gate returns whether to halt plus an optional finding. A halting
/// gate's finding becomes the sole result of the analysis.
pub type GateFn = fn(&LogDocument) -> (bool, Option<Finding>);

/// An independent rule returns zero or more findings.
pub type RuleFn = fn(&LogDocument) -> Vec<Finding>;

pub struct GatingRule {
    pub name: &'static str,
    pub run: GateFn,
}

pub struct Rule {
    pub name: &'static str,
    pub run: RuleFn,
}

/// Ordered gating rules followed by independent rules.
pub struct Catalog {
    pub gates: Vec<GatingRule>,
    pub rules: Vec<Rule>,
}

/// Wrap a rule function returning `Option<Finding>` or `Vec<Finding>`
/// into the uniform [`RuleFn`] shape.
macro_rules! rule {
    ($name:literal, $f:path) => {
        Rule {
            name: $name,
            run: |doc| $f(doc).into_iter().collect(),
        }
    };
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            gates: vec![
                GatingRule { name: "classic", run: core::classic },
                GatingRule { name: "crash", run: core::crash },
            ],
            rules: vec![
                rule!("obs_version", core::obs_version),
                rule!("two_instances", core::two_instances),
                rule!("autoconfig", core::autoconfig),
                rule!("cpu_tier", core::cpu_tier),
                rule!("amd_drivers", graphics::amd_drivers),
                rule!("nvidia_drivers", graphics::nvidia_drivers),
                rule!("init_failed", graphics::init_failed),
                rule!("wayland", linux::wayland),
                rule!("nvidia_egl", graphics::nvidia_egl),
                rule!("nvenc_start_failure", encoding::nvenc_start_failure),
                rule!("geforce_940", windows::geforce_940),
                rule!("killer_nic", network::killer_nic),
                rule!("wifi_streaming", network::wifi_streaming),
                rule!("bind_to_ip", network::bind_to_ip),
                rule!("macos_version", macos::macos_version),
                rule!("admin_rights", windows::admin_rights),
                rule!("import_conflicts", plugins::import_conflicts),
                rule!("bit32_on_64bit", windows::bit32_on_64bit),
                rule!("rosetta", macos::rosetta),
                rule!("output_attempt", core::output_attempt),
                rule!("mp4_recording", encoding::mp4_recording),
                rule!("x264_preset", encoding::x264_preset),
                rule!("custom_ffmpeg", encoding::custom_ffmpeg),
                rule!("browser_accel", sources::browser_accel),
                rule!("audio_buffering", audio::buffering),
                rule!("dropped_frames", network::dropped_frames),
                rule!("render_lag", graphics::render_lag),
                rule!("encode_error", encoding::encode_error),
                rule!("encoder_overload", encoding::encoder_overload),
                rule!("shared_memory_capture", sources::shared_memory_capture),
                rule!("stream_bitrate", encoding::stream_bitrate),
                rule!("software_rasterizer", windows::software_rasterizer),
                rule!("wasapi_sample_rates", windows::wasapi_sample_rates),
                rule!("opengl_on_windows", windows::opengl_on_windows),
                rule!("game_dvr", windows::game_dvr),
                rule!("game_mode", windows::game_mode),
                rule!("hardware_gpu_scheduler", windows::hardware_gpu_scheduler),
                rule!("nic_speed", network::nic_speed),
                rule!("dynamic_bitrate", network::dynamic_bitrate),
                rule!("network_optimizations", network::network_optimizations),
                rule!("tcp_pacing", network::tcp_pacing),
                rule!("stream_delay", network::stream_delay),
                rule!("unknown_encoder", encoding::unknown_encoder),
                rule!("browser_source_missing", sources::browser_source_missing),
                rule!("monitoring_device", audio::monitoring_device),
                rule!("plugin_list", plugins::plugin_list),
                rule!("lenovo_vantage", network::lenovo_vantage),
                rule!("portable_mode", core::portable_mode),
                rule!("safe_mode", core::safe_mode),
                rule!("distribution", linux::distribution),
                rule!("flatpak", linux::flatpak),
                rule!("snap_package", linux::snap_package),
                rule!("x11_captures", linux::x11_captures),
                rule!("desktop_environment", linux::desktop_environment),
                rule!("missing_modules", linux::missing_modules),
                rule!("virtual_camera", linux::virtual_camera),
                rule!("mac_permissions", macos::permissions),
                rule!("video_settings", graphics::video_settings),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_both_gates_first() {
        let catalog = Catalog::default();
        let names: Vec<&str> = catalog.gates.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["classic", "crash"]);
    }

    #[test]
    fn rule_names_are_unique() {
        let catalog = Catalog::default();
        let mut names: Vec<&str> = catalog.rules.iter().map(|r| r.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn option_and_vec_rules_share_one_shape() {
        // Rules that return Option<Finding> and rules that return
        // Vec<Finding> both wrap into RuleFn.
        let single = rule!("single", crate::rules::core::two_instances);
        let multi = rule!("multi", crate::rules::graphics::video_settings);
        let empty = crate::LogDocument::from_text("");
        assert!((single.run)(&empty).is_empty());
        assert!((multi.run)(&empty).is_empty());
    }
}
