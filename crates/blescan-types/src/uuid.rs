//! Bluetooth UUIDs used when filtering scans by service.
//!
//! Short (16/32-bit) assigned numbers are expanded against the Bluetooth
//! Base UUID `00000000-0000-1000-8000-00805f9b34fb`.

use uuid::{Uuid, uuid};

/// The Bluetooth Base UUID that short assigned numbers are relative to.
pub const BLUETOOTH_BASE_UUID: Uuid = uuid!("00000000-0000-1000-8000-00805f9b34fb");

// --- Standard BLE Service UUIDs ---

/// Generic Access Profile (GAP) service.
pub const GAP_SERVICE: Uuid = uuid!("00001800-0000-1000-8000-00805f9b34fb");

/// Generic Attribute Profile (GATT) service.
pub const GATT_SERVICE: Uuid = uuid!("00001801-0000-1000-8000-00805f9b34fb");

/// Device Information service.
pub const DEVICE_INFO_SERVICE: Uuid = uuid!("0000180a-0000-1000-8000-00805f9b34fb");

/// Heart Rate service.
pub const HEART_RATE_SERVICE: Uuid = uuid!("0000180d-0000-1000-8000-00805f9b34fb");

/// Battery service.
pub const BATTERY_SERVICE: Uuid = uuid!("0000180f-0000-1000-8000-00805f9b34fb");

/// Environmental Sensing service.
pub const ENVIRONMENTAL_SENSING_SERVICE: Uuid = uuid!("0000181a-0000-1000-8000-00805f9b34fb");

/// Cycling Speed and Cadence service.
pub const CYCLING_SPEED_CADENCE_SERVICE: Uuid = uuid!("00001816-0000-1000-8000-00805f9b34fb");

/// Human Interface Device service.
pub const HID_SERVICE: Uuid = uuid!("00001812-0000-1000-8000-00805f9b34fb");

/// Nordic UART service (vendor specific, common on dev kits).
pub const NORDIC_UART_SERVICE: Uuid = uuid!("6e400001-b5a3-f393-e0a9-e50e24dcca9e");

/// Well-known service names accepted on the command line, with their UUIDs.
pub const KNOWN_SERVICES: &[(&str, Uuid)] = &[
    ("generic-access", GAP_SERVICE),
    ("generic-attribute", GATT_SERVICE),
    ("device-information", DEVICE_INFO_SERVICE),
    ("heart-rate", HEART_RATE_SERVICE),
    ("battery", BATTERY_SERVICE),
    ("environmental-sensing", ENVIRONMENTAL_SENSING_SERVICE),
    ("cycling-speed-cadence", CYCLING_SPEED_CADENCE_SERVICE),
    ("hid", HID_SERVICE),
    ("nordic-uart", NORDIC_UART_SERVICE),
];

/// Expand a 16 or 32-bit assigned number into a full 128-bit UUID.
#[must_use]
pub fn from_short(short: u32) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID.as_u128() | ((short as u128) << 96))
}

/// Return the 32-bit short form if `uuid` sits on the Bluetooth base.
#[must_use]
pub fn to_short(uuid: &Uuid) -> Option<u32> {
    let value = uuid.as_u128();
    let mask = (1u128 << 96) - 1;
    if value & mask == BLUETOOTH_BASE_UUID.as_u128() {
        Some((value >> 96) as u32)
    } else {
        None
    }
}

/// Look up a well-known service by name (case-insensitive, `_` and ` ` treated as `-`).
#[must_use]
pub fn known_service(name: &str) -> Option<Uuid> {
    let normalized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect();
    KNOWN_SERVICES
        .iter()
        .find(|(n, _)| *n == normalized)
        .map(|(_, uuid)| *uuid)
}

/// Reverse lookup of a well-known service name.
#[must_use]
pub fn service_name(uuid: &Uuid) -> Option<&'static str> {
    KNOWN_SERVICES
        .iter()
        .find(|(_, u)| u == uuid)
        .map(|(n, _)| *n)
}
