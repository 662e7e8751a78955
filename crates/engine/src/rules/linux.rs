//! Linux environment rules: distribution, packaging, display server.
//!
//! Environment descriptors (distribution, desktop environment, session
//! type) surface as Info findings whose title carries the value and whose
//! detail is empty. They orient a human reader; only the misconfiguration
//! findings carry advice.

use crate::document::LogDocument;
use crate::report::Finding;
use crate::search::find_all;

/// Stock modules that commonly fail to load on broken packaging.
const LOADABLE_MODULES: [&str; 3] = ["obs-browser.so", "obs-websocket.so", "vlc-video.so"];

fn distro_line<'a>(doc: &'a LogDocument) -> Option<&'a str> {
    find_all("Distribution:", doc.lines()).first().copied()
}

fn is_flatpak(doc: &LogDocument) -> bool {
    !find_all("Flatpak Runtime:", doc.lines()).is_empty()
}

fn session_type<'a>(doc: &'a LogDocument) -> Option<&'a str> {
    find_all("Session Type:", doc.lines()).first().copied()
}

pub fn distribution(doc: &LogDocument) -> Option<Finding> {
    let line = distro_line(doc)?;
    let name = line.split_whitespace().skip(2).collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return None;
    }
    Some(Finding::info(name, ""))
}

pub fn flatpak(doc: &LogDocument) -> Option<Finding> {
    is_flatpak(doc).then(|| {
        Finding::info(
            "Flatpak",
            "You are using the Flatpak package of OBS. Plugins are only available as Flatpak \
extensions, which you can find in your distribution's software center or via \
<code>flatpak search com.obsproject.Studio</code>. Installation of external plugins is not \
supported.",
        )
    })
}

pub fn snap_package(doc: &LogDocument) -> Option<Finding> {
    if !distro_line(doc)?.contains("\"Ubuntu Core\"") {
        return None;
    }
    Some(Finding::warning(
        "Snap Package",
        "You are using the Snap package of OBS. It is not officially supported and its sandbox \
restricts features like the virtual camera, browser docks and some capture methods. Install OBS \
from the official PPA or Flatpak instead.",
    ))
}

/// Wayland session diagnosis. Ubuntu 20.04 shipped a PipeWire too old for
/// screen capture; XWayland cannot capture native Wayland windows at all.
pub fn wayland(doc: &LogDocument) -> Option<Finding> {
    let distro = distro_line(doc);
    if distro.is_none() && !is_flatpak(doc) {
        return None;
    }
    if !session_type(doc)?.contains("wayland") {
        return None;
    }

    if distro.is_some_and(|l| l.contains("\"Ubuntu\"") && l.contains("\"20.04\"")) {
        return Some(Finding::critical(
            "Ubuntu 20.04 under Wayland",
            "The PipeWire version shipped with Ubuntu 20.04 is too old to support screen capture \
under Wayland. Either upgrade to a newer Ubuntu release or log into an Xorg/X11 session instead.",
        ));
    }
    if !find_all("Window System:", doc.lines()).is_empty() {
        return Some(Finding::critical(
            "Running under XWayland",
            "OBS is running through XWayland inside a Wayland session. Window and display capture \
cannot see native Wayland windows this way. Launch OBS as a native Wayland client, or log into an \
Xorg/X11 session.",
        ));
    }
    if !find_all("[pipewire] No capture", doc.lines()).is_empty() {
        return Some(Finding::critical(
            "No PipeWire capture on Wayland",
            "No PipeWire capture source is available, which means screen and window capture will \
not work in this Wayland session. Install the PipeWire and xdg-desktop-portal packages for your \
distribution and restart the session.",
        ));
    }
    Some(Finding::info("Wayland", ""))
}

pub fn x11_captures(doc: &LogDocument) -> Option<Finding> {
    if !session_type(doc)?.contains("x11") {
        return None;
    }
    let pipewire_capture = ["pipewire-desktop-capture-source", "pipewire-window-capture-source", "pipewire-screen-capture-source"]
        .iter()
        .any(|id| !find_all(id, doc.lines()).is_empty());
    if pipewire_capture {
        return Some(Finding::warning(
            "PipeWire capture on X11",
            "PipeWire capture sources are in use in an X11 session. These are designed for \
Wayland; under X11 use the regular Window Capture (Xcomposite) and Display Capture (XSHM) sources \
for better performance.",
        ));
    }
    Some(Finding::info("X11", ""))
}

pub fn desktop_environment(doc: &LogDocument) -> Option<Finding> {
    let line = find_all("Desktop Environment:", doc.lines()).first().copied()?;
    let name = line.split_whitespace().skip(3).collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return None;
    }
    Some(Finding::info(name, ""))
}

pub fn missing_modules(doc: &LogDocument) -> Option<Finding> {
    distro_line(doc)?;
    let missing: Vec<&str> = LOADABLE_MODULES
        .iter()
        .copied()
        .filter(|m| find_all(m, doc.lines()).is_empty())
        .collect();
    if missing.is_empty() {
        return None;
    }
    let items: String = missing.iter().map(|m| format!("<li>{m}</li>")).collect();
    Some(Finding::info(
        format!("Missing Modules ({})", missing.len()),
        format!(
            "Some commonly used modules are missing from this installation:<br><ul>{items}</ul>\
Browser sources, WebSocket control or VLC playlists will be unavailable. Install the corresponding \
packages from your distribution if you need these features."
        ),
    ))
}

pub fn virtual_camera(doc: &LogDocument) -> Option<Finding> {
    if find_all("v4l2loopback not installed", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Virtual Camera not available",
        "The v4l2loopback kernel module is not installed, so the virtual camera cannot start. \
Install v4l2loopback-dkms (or your distribution's equivalent) to use the virtual camera.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::doc;

    #[test]
    fn distribution_becomes_titled_descriptor() {
        let d = doc(&["12:00: Distribution: \"Arch Linux\" Unknown"]);
        let f = distribution(&d).unwrap();
        assert_eq!(f.title, "\"Arch Linux\" Unknown");
        assert!(f.detail.is_empty());
    }

    #[test]
    fn flatpak_carries_extension_guidance() {
        let d = doc(&["12:00: Flatpak Runtime: org.kde.Platform/x86_64/6.6"]);
        let f = flatpak(&d).unwrap();
        assert_eq!(f.title, "Flatpak");
        assert!(f.detail.contains("flatpak search com.obsproject.Studio"));
        assert_eq!(flatpak(&doc(&["clean"])), None);
    }

    #[test]
    fn snap_detected_from_ubuntu_core() {
        let d = doc(&["12:00: Distribution: \"Ubuntu Core\" \"22\""]);
        assert_eq!(snap_package(&d).unwrap().title, "Snap Package");
        let regular = doc(&["12:00: Distribution: \"Ubuntu\" \"22.04\""]);
        assert_eq!(snap_package(&regular), None);
    }

    #[test]
    fn ubuntu_2004_wayland_is_critical() {
        let d = doc(&[
            "12:00: Distribution: \"Ubuntu\" \"20.04\"",
            "12:00: Session Type: wayland",
        ]);
        let f = wayland(&d).unwrap();
        assert_eq!(f.title, "Ubuntu 20.04 under Wayland");
    }

    #[test]
    fn xwayland_detected_via_window_system_line() {
        let d = doc(&[
            "12:00: Distribution: \"Fedora Linux\" \"40\"",
            "12:00: Session Type: wayland",
            "12:00: Window System: X11.0, Vendor: The X.Org Foundation",
        ]);
        assert_eq!(wayland(&d).unwrap().title, "Running under XWayland");
    }

    #[test]
    fn plain_wayland_is_a_descriptor() {
        let d = doc(&[
            "12:00: Distribution: \"Fedora Linux\" \"40\"",
            "12:00: Session Type: wayland",
        ]);
        let f = wayland(&d).unwrap();
        assert_eq!(f.title, "Wayland");
        assert!(f.detail.is_empty());
    }

    #[test]
    fn wayland_rule_needs_linux_fingerprint() {
        let d = doc(&["12:00: Session Type: wayland"]);
        assert_eq!(wayland(&d), None);
    }

    #[test]
    fn pipewire_capture_on_x11_flagged() {
        let d = doc(&[
            "12:00: Session Type: x11",
            "12:00:     - source: 'screen' (pipewire-screen-capture-source)",
        ]);
        assert_eq!(x11_captures(&d).unwrap().title, "PipeWire capture on X11");
        let plain = doc(&["12:00: Session Type: x11"]);
        assert_eq!(x11_captures(&plain).unwrap().title, "X11");
    }

    #[test]
    fn missing_modules_lists_only_absent_ones() {
        let d = doc(&[
            "12:00: Distribution: \"Debian GNU/Linux\" \"12\"",
            "12:00:          obs-browser.so",
        ]);
        let f = missing_modules(&d).unwrap();
        assert_eq!(f.title, "Missing Modules (2)");
        assert!(f.detail.contains("obs-websocket.so"));
        assert!(f.detail.contains("vlc-video.so"));
        assert!(!f.detail.contains("<li>obs-browser.so</li>"));
    }

    #[test]
    fn desktop_environment_descriptor() {
        let d = doc(&["12:00: Desktop Environment: GNOME (GNOME)"]);
        assert_eq!(desktop_environment(&d).unwrap().title, "GNOME (GNOME)");
    }

    #[test]
    fn vcam_module_absent() {
        let d = doc(&["12:00: v4l2loopback not installed, virtual camera disabled"]);
        assert!(virtual_camera(&d).is_some());
    }
}
