//! Display formatting for metric values.

use humansize::{format_size, FormatSizeOptions, WINDOWS};

/// Shown when a metric could not be read.
pub const PLACEHOLDER: &str = "--";

pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, FormatSizeOptions::from(WINDOWS).decimal_places(1))
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    let bps = if bytes_per_sec.is_finite() {
        bytes_per_sec.max(0.0)
    } else {
        0.0
    };
    if bps < 1024.0 {
        format!("{:.0} B/s", bps)
    } else if bps < 1024.0 * 1024.0 {
        format!("{:.1} KB/s", bps / 1024.0)
    } else {
        format!("{:.2} MB/s", bps / (1024.0 * 1024.0))
    }
}

pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    }
}

pub fn format_percent(value: Option<u8>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{}%", v))
}

/// Rounded percentage from a raw value, `None` when not finite.
pub fn round_percent(value: f32) -> Option<u8> {
    value
        .is_finite()
        .then(|| value.clamp(0.0, 100.0).round() as u8)
}
