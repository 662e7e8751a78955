//! Streaming network health: dropped frames, NIC quirks, socket tuning.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::LogDocument;
use crate::fields::peak_percent;
use crate::report::{Finding, Severity};
use crate::rules::fmt_percent;
use crate::search::{find_all, find_all_excluding};

/// Interface summary line; the speed part is either a single figure or a
/// `down↓/up↑` pair on asymmetric links.
static NIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)Interface: (?P<nicname>.+) \(ethernet, ((?P<speed>\d+)|((?P<downspeed>\d+)↓/(?P<upspeed>\d+)↑)) mbps\)",
    )
    .unwrap()
});

fn drop_severity(peak: f64) -> Severity {
    if peak >= 15.0 {
        Severity::Critical
    } else if peak >= 5.0 {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Frames dropped for insufficient bandwidth, worst percentage across all
/// real outputs. Bandwidth-test sessions are excluded.
pub fn dropped_frames(doc: &LogDocument) -> Option<Finding> {
    let hits = find_all_excluding("insufficient bandwidth", doc.lines(), &["test_stream"]);
    let peak = peak_percent(&hits)?;
    Some(Finding::new(
        drop_severity(peak),
        format!("{}% Dropped Frames", fmt_percent(peak)),
        "Your log contains streaming sessions with dropped frames. This can only be caused by a \
connection issue and not by OBS itself. Follow the troubleshooting steps at: \
<a href=\"https://obsproject.com/kb/dropped-frames-and-general-connection-issues\">Dropped Frames \
and General Connection Issues</a>.",
    ))
}

pub fn killer_nic(doc: &LogDocument) -> Option<Finding> {
    if find_all("Interface: Killer", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Killer NIC",
        "Killer's Firewall is known for it's poor performance and issues when trying to stream. \
Please download the driver pack from \
<a href=\"https://www.intel.com/content/www/us/en/download/19779/intel-killer-performance-suite.html\">\
the vendor's site</a> and run the driver installer. Then go to %ProgramFiles%\\KillerNetworking\\\
Killer-Cleaner and run the cleaner to remove the Killer software suite while keeping the base \
driver.",
    ))
}

pub fn lenovo_vantage(doc: &LogDocument) -> Option<Finding> {
    if find_all("Lenovo Vantage / Legion Edge is installed.", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Lenovo Vantage",
        "Lenovo Vantage / Legion Edge is installed. The \"Network Boost\" feature of this software \
is known to cause network issues while streaming. Disable Network Boost in the Legion Edge section \
of Lenovo Vantage, or uninstall the software entirely.",
    ))
}

pub fn wifi_streaming(doc: &LogDocument) -> Option<Finding> {
    if find_all("802.11", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Wi-Fi Streaming",
        "In many cases, Wi-Fi connections can cause issues because of their unstable nature. \
Streaming really requires a stable connection. Often wireless connections are fine, but if you \
have problems, then we are going to be very suspicious of the Wi-Fi. Please consider using a wired \
connection to improve the stability of your stream.",
    ))
}

pub fn bind_to_ip(doc: &LogDocument) -> Option<Finding> {
    if find_all("Binding to ", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::warning(
        "Binding to IP",
        "Binding to a manually chosen IP address is rarely needed. Go to Settings -> Advanced -> \
Network and make sure \"Bind to IP\" is set to \"Default\", unless you absolutely know that you \
need a different setting.",
    ))
}

/// A gigabit-class NIC negotiating below 1000 mbps points at cabling or
/// switch problems. On asymmetric links only the upload figure matters.
pub fn nic_speed(doc: &LogDocument) -> Option<Finding> {
    for line in find_all("Interface: ", doc.lines()) {
        let Some(caps) = NIC_RE.captures(line) else {
            continue;
        };
        let speed = caps
            .name("speed")
            .or_else(|| caps.name("upspeed"))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(1000);
        let nic = &caps["nicname"];
        if speed < 1000 && (nic.contains("GbE") || nic.contains("Gigabit")) {
            return Some(Finding::warning(
                "Slow Network Connection",
                "Your gigabit-capable network card is connected at a lower speed than it supports. \
This usually indicates a bad network cable or a router/switch problem, and can cause dropped \
frames while streaming. Check your cabling and the port your machine is plugged into.",
            ));
        }
    }
    None
}

pub fn dynamic_bitrate(doc: &LogDocument) -> Option<Finding> {
    if find_all("Dynamic bitrate enabled", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Dynamic Bitrate",
        "Dynamic bitrate is enabled. Instead of dropping frames when network issues are detected, \
OBS will automatically reduce the stream quality to compensate. The bitrate will adjust back to \
normal once the connection becomes stable. In some (rare) cases the bitrate algorithm can get \
stuck at a low bitrate; if this happens, simply restart your stream, or disable dynamic bitrate in \
Settings -> Advanced -> Network.",
    ))
}

pub fn network_optimizations(doc: &LogDocument) -> Option<Finding> {
    if find_all("New socket loop enabled by user", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Network Optimizations",
        "Network optimizations are enabled. These can cause connection issues with certain setups. \
If you experience issues like the stream key being rejected or disconnections mid-stream, disable \
\"Enable network optimizations\" in Settings -> Advanced -> Network.",
    ))
}

pub fn tcp_pacing(doc: &LogDocument) -> Option<Finding> {
    if find_all("Low latency mode enabled by user", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "TCP Pacing",
        "Low latency mode (TCP pacing) is enabled. This is an experimental setting that can cause \
dropped frames on some setups. If you experience network issues, disable \"Low latency mode\" in \
Settings -> Advanced -> Network.",
    ))
}

pub fn stream_delay(doc: &LogDocument) -> Option<Finding> {
    if find_all("second delay active", doc.lines()).is_empty() {
        return None;
    }
    Some(Finding::info(
        "Stream Delay",
        "A stream delay is active. Viewers will see your stream delayed and chat interaction will \
lag behind. If this is not intended, disable it in Settings -> Advanced -> Stream Delay.",
    ))
}
