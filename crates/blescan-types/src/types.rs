//! Core types shared by scan sessions and their hosts.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParseError, ParseResult};

/// Placeholder shown when a device reports no usable name.
pub const NO_NAME: &str = "(no name)";

/// Placeholder shown when a device reports no usable address.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// A GATT service identifier used to restrict scan results.
///
/// Parses full 128-bit UUIDs, 16/32-bit assigned numbers (with or without a
/// `0x` prefix) and a handful of well-known service names.
///
/// # Examples
///
/// ```
/// use blescan_types::ServiceId;
///
/// let hr: ServiceId = "heart-rate".parse().unwrap();
/// assert_eq!(hr, "0x180D".parse().unwrap());
/// assert_eq!(hr, "0000180d-0000-1000-8000-00805f9b34fb".parse().unwrap());
/// assert_eq!(hr.to_string(), "0x180D");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ServiceId(Uuid);

impl ServiceId {
    /// Wrap a full UUID.
    #[must_use]
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Build from a 16 or 32-bit assigned number.
    #[must_use]
    pub fn from_short(short: u32) -> Self {
        Self(crate::uuid::from_short(short))
    }

    /// The full 128-bit UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.0
    }

    /// The well-known name of this service, if there is one.
    #[must_use]
    pub fn known_name(&self) -> Option<&'static str> {
        crate::uuid::service_name(&self.0)
    }

    fn parse_short(s: &str) -> Option<u32> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if !(hex.len() == 4 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }
}

impl From<Uuid> for ServiceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ServiceId> for Uuid {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

impl FromStr for ServiceId {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        if let Some(uuid) = crate::uuid::known_service(s) {
            return Ok(Self(uuid));
        }
        if let Some(short) = Self::parse_short(s) {
            return Ok(Self::from_short(short));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseError::InvalidServiceId(s.to_string()))
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::uuid::to_short(&self.0) {
            Some(short) if short <= 0xFFFF => write!(f, "0x{:04X}", short),
            Some(short) => write!(f, "0x{:08X}", short),
            None => write!(f, "{}", self.0.hyphenated()),
        }
    }
}

/// Radio duty cycle requested from the platform scanner.
///
/// Discriminants follow the values commonly used by mobile BLE stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[non_exhaustive]
pub enum ScanMode {
    /// Only receive results from scans started by other clients.
    Opportunistic,
    /// Lowest power draw, longest discovery latency.
    LowPower,
    /// Compromise between power and latency.
    Balanced,
    /// Highest duty cycle. Used for foreground scans.
    #[default]
    LowLatency,
}

impl ScanMode {
    /// The numeric value of the mode.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        match self {
            ScanMode::Opportunistic => -1,
            ScanMode::LowPower => 0,
            ScanMode::Balanced => 1,
            ScanMode::LowLatency => 2,
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Opportunistic => write!(f, "opportunistic"),
            ScanMode::LowPower => write!(f, "low-power"),
            ScanMode::Balanced => write!(f, "balanced"),
            ScanMode::LowLatency => write!(f, "low-latency"),
        }
    }
}

/// A runtime capability the host may or may not grant.
///
/// Collapses platform permission and OS version checks into a single
/// predicate the session can ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[non_exhaustive]
pub enum Capability {
    /// Start and stop LE scans.
    Scan,
    /// Read peer identity such as the platform-resolved device name.
    Connect,
}

impl Capability {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Capability::Scan => "scan",
            Capability::Connect => "connect",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of the local radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdapterStatus {
    /// An adapter exists on this host.
    pub present: bool,
    /// The adapter is powered on.
    pub enabled: bool,
}

impl AdapterStatus {
    /// No adapter at all.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            present: false,
            enabled: false,
        }
    }

    /// Adapter present but powered off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            present: true,
            enabled: false,
        }
    }

    /// Adapter present and powered on.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            present: true,
            enabled: true,
        }
    }

    /// Whether a scan could be started as far as the radio is concerned.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.present && self.enabled
    }
}

/// Reason code reported by the platform when a running scan fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum ScanFailureCode {
    /// A scan with the same settings is already running.
    AlreadyStarted,
    /// The scanner could not register the application.
    ApplicationRegistrationFailed,
    /// Internal error in the radio stack.
    InternalError,
    /// The requested scan feature is not supported.
    FeatureUnsupported,
    /// No hardware resources left to start the scan.
    OutOfHardwareResources,
    /// Scans were started too often in a short period.
    ScanningTooFrequently,
    /// A code without a known meaning.
    Unknown(i32),
}

impl ScanFailureCode {
    /// Numeric code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            ScanFailureCode::AlreadyStarted => 1,
            ScanFailureCode::ApplicationRegistrationFailed => 2,
            ScanFailureCode::InternalError => 3,
            ScanFailureCode::FeatureUnsupported => 4,
            ScanFailureCode::OutOfHardwareResources => 5,
            ScanFailureCode::ScanningTooFrequently => 6,
            ScanFailureCode::Unknown(code) => *code,
        }
    }
}

impl From<i32> for ScanFailureCode {
    fn from(value: i32) -> Self {
        match value {
            1 => ScanFailureCode::AlreadyStarted,
            2 => ScanFailureCode::ApplicationRegistrationFailed,
            3 => ScanFailureCode::InternalError,
            4 => ScanFailureCode::FeatureUnsupported,
            5 => ScanFailureCode::OutOfHardwareResources,
            6 => ScanFailureCode::ScanningTooFrequently,
            other => ScanFailureCode::Unknown(other),
        }
    }
}

impl fmt::Display for ScanFailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanFailureCode::AlreadyStarted => "scan already started",
            ScanFailureCode::ApplicationRegistrationFailed => "application registration failed",
            ScanFailureCode::InternalError => "internal error",
            ScanFailureCode::FeatureUnsupported => "feature unsupported",
            ScanFailureCode::OutOfHardwareResources => "out of hardware resources",
            ScanFailureCode::ScanningTooFrequently => "scanning too frequently",
            ScanFailureCode::Unknown(_) => "unknown error",
        };
        write!(f, "{} (code {})", label, self.code())
    }
}

/// A raw discovery report as delivered by the platform scanner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanRecord {
    /// Name resolved by the platform for the peer. Reading it needs
    /// [`Capability::Connect`].
    pub name: Option<String>,
    /// Local name carried in the advertisement payload.
    pub advertised_name: Option<String>,
    /// Hardware address or platform identifier.
    pub address: Option<String>,
    /// Received signal strength in dBm.
    pub rssi: i16,
    /// Service UUIDs listed in the advertisement.
    #[cfg_attr(feature = "serde", serde(default))]
    pub services: Vec<Uuid>,
}

impl ScanRecord {
    /// Create a record with an address and RSSI.
    pub fn new(address: impl Into<String>, rssi: i16) -> Self {
        Self {
            address: Some(address.into()),
            rssi,
            ..Self::default()
        }
    }

    /// Set the platform-resolved name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the advertised local name.
    #[must_use]
    pub fn with_advertised_name(mut self, name: impl Into<String>) -> Self {
        self.advertised_name = Some(name.into());
        self
    }

    /// Add an advertised service.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<Uuid>) -> Self {
        self.services.push(service.into());
        self
    }

    /// Address used for display and deduplication.
    #[must_use]
    pub fn resolved_address(&self) -> &str {
        non_blank(self.address.as_deref()).unwrap_or(UNKNOWN_ADDRESS)
    }

    /// Display name: platform name (when readable), then advertised name,
    /// then [`NO_NAME`].
    #[must_use]
    pub fn resolved_name(&self, name_readable: bool) -> &str {
        let platform = if name_readable {
            non_blank(self.name.as_deref())
        } else {
            None
        };
        platform
            .or_else(|| non_blank(self.advertised_name.as_deref()))
            .unwrap_or(NO_NAME)
    }

    /// Whether the advertisement lists `service`.
    #[must_use]
    pub fn advertises(&self, service: &ServiceId) -> bool {
        self.services.contains(&service.uuid())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A device as presented to the observer.
///
/// Transient: built per discovery callback and never stored by the session.
/// The `Display` impl is the formatted list line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscoveredDevice {
    /// Display name, never empty.
    pub name: String,
    /// Address, never empty.
    pub address: String,
    /// Received signal strength in dBm.
    pub signal_strength: i16,
}

impl DiscoveredDevice {
    /// Resolve a raw record into a display device.
    ///
    /// ```
    /// use blescan_types::{DiscoveredDevice, ScanRecord};
    ///
    /// let record = ScanRecord::new("AA:BB:CC:DD:EE:FF", -60).with_advertised_name("Sensor");
    /// let device = DiscoveredDevice::from_record(&record, false);
    /// assert_eq!(device.to_string(), "Sensor (AA:BB:CC:DD:EE:FF) RSSI: -60 dBm");
    /// ```
    #[must_use]
    pub fn from_record(record: &ScanRecord, name_readable: bool) -> Self {
        Self {
            name: record.resolved_name(name_readable).to_string(),
            address: record.resolved_address().to_string(),
            signal_strength: record.rssi,
        }
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) RSSI: {} dBm",
            self.name, self.address, self.signal_strength
        )
    }
}
