//! Trait abstractions for the host environment.
//!
//! A [`crate::ScanSession`] never talks to a Bluetooth stack directly. The
//! host supplies:
//!
//! - a [`RadioAdapter`] that reports whether a radio exists and is on, and
//!   hands out a [`Scanner`],
//! - a [`Capabilities`] predicate standing in for runtime permissions,
//! - a [`ScanObserver`] that renders state, devices and errors.
//!
//! The btleplug host in [`crate::scan`] and the in-memory host in
//! [`crate::mock`] both implement these.

use std::sync::Arc;

use async_trait::async_trait;

use blescan_types::{AdapterStatus, Capability, DiscoveredDevice, ScanMode, ServiceId};

use crate::callbacks::{ScanCallbacks, ScanHandle};
use crate::error::Result;

/// The local Bluetooth radio.
#[async_trait]
pub trait RadioAdapter: Send + Sync {
    /// Whether an adapter exists and whether it is powered on.
    async fn status(&self) -> AdapterStatus;

    /// Obtain the LE scanner, if the stack can provide one right now.
    async fn scanner(&self) -> Option<Arc<dyn Scanner>>;
}

/// Platform scan primitive.
///
/// # Example
///
/// ```ignore
/// use blescan_core::{Scanner, ScanCallbacks};
/// use blescan_types::ScanMode;
///
/// async fn scan_everything(scanner: &dyn Scanner, callbacks: ScanCallbacks) {
///     let handle = scanner.start_scan(&[], ScanMode::LowLatency, callbacks).await?;
///     // ... results arrive through the callbacks ...
///     scanner.stop_scan(handle).await?;
/// }
/// ```
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Start scanning. An empty `filters` slice means no filtering; otherwise
    /// only advertisements listing one of the services are reported.
    ///
    /// Fails with [`crate::Error::Security`] (or a btleplug permission error)
    /// when the platform refuses the scan.
    async fn start_scan(
        &self,
        filters: &[ServiceId],
        mode: ScanMode,
        callbacks: ScanCallbacks,
    ) -> Result<ScanHandle>;

    /// Stop the scan identified by `handle`.
    async fn stop_scan(&self, handle: ScanHandle) -> Result<()>;
}

/// Runtime capability predicate.
pub trait Capabilities: Send + Sync {
    /// Whether `capability` is currently granted.
    fn has_capability(&self, capability: Capability) -> bool;
}

impl<F> Capabilities for F
where
    F: Fn(Capability) -> bool + Send + Sync,
{
    fn has_capability(&self, capability: Capability) -> bool {
        self(capability)
    }
}

/// Receiver of everything a scan session reports.
///
/// Called only from the task that owns the session.
pub trait ScanObserver: Send {
    /// The session started or stopped scanning.
    fn on_scan_state_changed(&mut self, is_scanning: bool, status: &str);

    /// A device was seen for the first time in this session. Its `Display`
    /// output is the formatted list line.
    fn on_device_found(&mut self, device: &DiscoveredDevice);

    /// A human-readable error for a failed start or a failed scan.
    fn on_scan_error(&mut self, message: &str);
}
