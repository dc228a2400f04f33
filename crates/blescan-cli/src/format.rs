//! Output formatting for scan results.

use anyhow::Result;
use blescan_types::{DiscoveredDevice, ServiceId};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::style;

/// One device as printed while scanning: signal bar, then the device line.
#[must_use]
pub fn format_device_line(device: &DiscoveredDevice, no_color: bool) -> String {
    format!(
        "{}  {}",
        style::format_signal_bar(device.signal_strength, no_color),
        device
    )
}

/// Full text listing, used when output goes to a file or after a quiet scan.
#[must_use]
pub fn format_scan_text(devices: &[DiscoveredDevice], no_color: bool) -> String {
    if devices.is_empty() {
        return "No devices found.\n".to_string();
    }

    let count = if no_color {
        devices.len().to_string()
    } else {
        devices.len().to_string().green().bold().to_string()
    };
    let mut out = format!("Found {} device(s)\n\n", count);
    for device in devices {
        out.push_str(&format_device_line(device, no_color));
        out.push('\n');
    }
    out
}

/// Scan results as a JSON document.
pub fn format_scan_json(
    devices: &[DiscoveredDevice],
    service: Option<&ServiceId>,
    compact: bool,
) -> Result<String> {
    #[derive(Serialize)]
    struct ScanResult<'a> {
        count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        service: Option<String>,
        devices: &'a [DiscoveredDevice],
    }

    let result = ScanResult {
        count: devices.len(),
        service: service.map(ToString::to_string),
        devices,
    };

    let mut json = if compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    json.push('\n');
    Ok(json)
}
