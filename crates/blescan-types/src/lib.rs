//! Platform-agnostic types for BLE scan sessions.
//!
//! This crate provides the values exchanged between a scan session, the
//! host that runs the radio, and whatever renders the results.
//!
//! # Features
//!
//! - Service identifiers with short-form and well-known-name parsing
//! - Adapter status, scan modes and capabilities
//! - Raw scan records and the resolved devices shown to users
//! - Error types for value parsing
//!
//! # Example
//!
//! ```
//! use blescan_types::{DiscoveredDevice, ScanRecord, ServiceId};
//!
//! let filter: ServiceId = "battery".parse().unwrap();
//! let record = ScanRecord::new("11:22:33:44:55:66", -70).with_service(filter);
//! assert!(record.advertises(&filter));
//!
//! let device = DiscoveredDevice::from_record(&record, true);
//! assert_eq!(device.name, "(no name)");
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{
    AdapterStatus, Capability, DiscoveredDevice, NO_NAME, ScanFailureCode, ScanMode, ScanRecord,
    ServiceId, UNKNOWN_ADDRESS,
};
pub use uuid as uuids;
