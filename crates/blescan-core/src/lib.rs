//! BLE scan session library.
//!
//! This crate manages the lifecycle of a Bluetooth Low Energy discovery scan:
//! checking that a scan can run at all, starting and stopping it, reporting
//! each nearby device once, and surfacing failures as readable messages.
//!
//! # Features
//!
//! - **Precondition checks**: adapter present, adapter on, scan permission,
//!   scanner obtainable, evaluated in that order
//! - **Deduplication**: one report per device address per scan session
//! - **Service filtering**: optionally restrict a scan to one advertised service
//! - **Stale callback protection**: results from a replaced scan are dropped
//! - **Pluggable hosts**: the btleplug host for real radios, a mock host for tests
//! - **Event stream**: serializable [`SessionEvent`]s over a broadcast channel
//!
//! # Platform Differences
//!
//! - **macOS**: CoreBluetooth hides MAC addresses and reports
//!   `00:00:00:00:00:00`. The btleplug host substitutes the peripheral UUID,
//!   which is stable per device on a given Mac.
//! - **Linux/Windows**: devices are reported by their MAC address
//!   (e.g., `AA:BB:CC:DD:EE:FF`).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use blescan_core::scan::BtleAdapter;
//! use blescan_core::{CapabilitySet, EventObserver, ScanSession, SessionEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = Arc::new(BtleAdapter::first().await?);
//!     let mut session = ScanSession::new(adapter, Arc::new(CapabilitySet::all()));
//!
//!     let observer = EventObserver::default();
//!     let mut events = observer.subscribe();
//!     session.start_unfiltered(observer).await?;
//!
//!     let cancel = CancellationToken::new();
//!     let timer = cancel.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_secs(5)).await;
//!         timer.cancel();
//!     });
//!     session.run_until_cancelled(&cancel).await;
//!     session.stop().await;
//!
//!     while let Ok(event) = events.try_recv() {
//!         if let SessionEvent::DeviceFound { line, .. } = event {
//!             println!("{}", line);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod capabilities;
pub mod error;
pub mod events;
pub mod mock;
pub mod scan;
pub mod session;
pub mod traits;
pub mod util;

// Re-export types and uuid modules from blescan-types
pub use blescan_types::types;
pub use blescan_types::uuid;

// Core exports
pub use callbacks::{ScanCallbacks, ScanHandle};
pub use capabilities::CapabilitySet;
pub use error::{Error, Result, ScanError};
pub use events::{
    EventObserver, EventReceiver, EventSender, QueueObserver, QueueReceiver, SessionEvent,
    event_channel,
};
pub use mock::{MockAdapter, MockScanner};
pub use scan::{BtleAdapter, BtleScanner, get_adapter};
pub use session::{STATUS_FAILED, STATUS_SCANNING, STATUS_STOPPED, ScanSession};
pub use traits::{Capabilities, RadioAdapter, ScanObserver, Scanner};
pub use util::format_peripheral_id;

// Re-export from blescan-types
pub use blescan_types::uuid as uuids;
pub use blescan_types::{
    AdapterStatus, Capability, DiscoveredDevice, ScanFailureCode, ScanMode, ScanRecord, ServiceId,
};
