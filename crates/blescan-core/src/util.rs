//! Helpers for turning btleplug peripheral data into scan records.

use btleplug::api::{BDAddr, PeripheralProperties};
use btleplug::platform::PeripheralId;

use blescan_types::ScanRecord;

/// Address CoreBluetooth reports for every peripheral.
pub const ZERO_ADDRESS: &str = "00:00:00:00:00:00";

/// Format a peripheral ID as a string.
///
/// On macOS, peripheral IDs are UUIDs. On other platforms they wrap the
/// Bluetooth address.
///
/// # Example
///
/// ```ignore
/// use blescan_core::util::format_peripheral_id;
///
/// let id = peripheral.id();
/// println!("Device: {}", format_peripheral_id(&id));
/// ```
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

/// Pick the identifier used as a device's address.
///
/// Uses the Bluetooth address unless it is the all-zero placeholder, in which
/// case `fallback` supplies one (the peripheral ID on macOS).
pub fn address_or_else(address: BDAddr, fallback: impl FnOnce() -> String) -> String {
    let address = address.to_string();
    if address == ZERO_ADDRESS {
        fallback()
    } else {
        address
    }
}

/// Build a scan record from a peripheral's properties.
///
/// btleplug exposes a single name (the advertised local name), so it fills
/// the advertised slot; the platform name stays empty. A missing RSSI is
/// reported as 0.
pub fn record_from_properties(address: String, properties: &PeripheralProperties) -> ScanRecord {
    let mut record = ScanRecord::new(address, properties.rssi.unwrap_or(0));
    if let Some(name) = &properties.local_name {
        record = record.with_advertised_name(name.clone());
    }
    for service in &properties.services {
        record = record.with_service(*service);
    }
    record
}
