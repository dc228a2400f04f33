//! In-memory host implementation for testing.
//!
//! This module provides an adapter and scanner that can be used for unit
//! testing without requiring actual BLE hardware.
//!
//! # Features
//!
//! - **Adapter state control**: switch between missing, disabled and ready
//! - **Failure injection**: make the next start fail, or every stop fail
//! - **Result injection**: emit records, batches and failures on the live scan
//! - **Call accounting**: count start/stop calls and live handles
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use blescan_core::mock::{MockAdapter, MockScanner};
//! use blescan_core::{CapabilitySet, ScanSession};
//!
//! let scanner = Arc::new(MockScanner::new());
//! let adapter = Arc::new(MockAdapter::new(Arc::clone(&scanner)));
//! let session = ScanSession::new(adapter, Arc::new(CapabilitySet::all()));
//! assert!(!session.is_running());
//! assert_eq!(scanner.start_count(), 0);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use blescan_types::{AdapterStatus, ScanFailureCode, ScanMode, ScanRecord, ServiceId};

use crate::callbacks::{ScanCallbacks, ScanHandle};
use crate::error::{Error, Result};
use crate::traits::{RadioAdapter, Scanner};

const LOCK_POISONED: &str = "mock lock poisoned - a thread panicked while holding the lock";

/// A mock radio adapter.
pub struct MockAdapter {
    status: Mutex<AdapterStatus>,
    scanner: Arc<MockScanner>,
    scanner_available: AtomicBool,
}

impl std::fmt::Debug for MockAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAdapter")
            .field("status", &*self.status.lock().expect(LOCK_POISONED))
            .field(
                "scanner_available",
                &self.scanner_available.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl MockAdapter {
    /// A present, powered-on adapter that hands out `scanner`.
    pub fn new(scanner: Arc<MockScanner>) -> Self {
        Self {
            status: Mutex::new(AdapterStatus::ready()),
            scanner,
            scanner_available: AtomicBool::new(true),
        }
    }

    /// Change the reported adapter status.
    pub fn set_status(&self, status: AdapterStatus) {
        *self.status.lock().expect(LOCK_POISONED) = status;
    }

    /// Make [`RadioAdapter::scanner`] return `None`.
    pub fn set_scanner_available(&self, available: bool) {
        self.scanner_available.store(available, Ordering::Relaxed);
    }
}

#[async_trait]
impl RadioAdapter for MockAdapter {
    async fn status(&self) -> AdapterStatus {
        *self.status.lock().expect(LOCK_POISONED)
    }

    async fn scanner(&self) -> Option<Arc<dyn Scanner>> {
        if self.scanner_available.load(Ordering::Relaxed) {
            Some(self.scanner.clone() as Arc<dyn Scanner>)
        } else {
            None
        }
    }
}

/// What the mock remembers about a live scan.
struct LiveScan {
    filters: Vec<ServiceId>,
    mode: ScanMode,
    callbacks: ScanCallbacks,
}

/// Failure to inject on the next start.
enum StartFailure {
    Security(String),
    Other(String),
}

/// A mock LE scanner.
///
/// Platform-side filtering is simulated: records emitted while a filtered
/// scan is live are only delivered if they advertise one of the services.
#[derive(Default)]
pub struct MockScanner {
    next_handle: AtomicU64,
    start_calls: AtomicU32,
    stop_calls: AtomicU32,
    live: Mutex<BTreeMap<u64, LiveScan>>,
    last_start: Mutex<Option<(Vec<ServiceId>, ScanMode)>>,
    fail_next_start: Mutex<Option<StartFailure>>,
    fail_stop: AtomicBool,
}

impl std::fmt::Debug for MockScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockScanner")
            .field("start_calls", &self.start_count())
            .field("stop_calls", &self.stop_count())
            .field("live", &self.live_scans())
            .finish()
    }
}

impl MockScanner {
    /// Create a scanner with no live scans.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Test control methods ---

    /// Make the next `start_scan` fail with a security error.
    pub fn fail_next_start_with_security(&self, message: &str) {
        *self.fail_next_start.lock().expect(LOCK_POISONED) =
            Some(StartFailure::Security(message.to_string()));
    }

    /// Make the next `start_scan` fail with a generic error.
    pub fn fail_next_start(&self, message: &str) {
        *self.fail_next_start.lock().expect(LOCK_POISONED) =
            Some(StartFailure::Other(message.to_string()));
    }

    /// Make every `stop_scan` fail (the handle is still released).
    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::Relaxed);
    }

    /// Deliver a record to the most recent live scan.
    ///
    /// Returns `false` if there is no live scan, the record does not match its
    /// filter, or the session is gone.
    pub fn emit(&self, record: ScanRecord) -> bool {
        let live = self.live.lock().expect(LOCK_POISONED);
        match live.values().next_back() {
            Some(scan) if Self::passes(&scan.filters, &record) => scan.callbacks.on_result(record),
            _ => false,
        }
    }

    /// Deliver a batch to the most recent live scan, after filtering.
    pub fn emit_batch(&self, records: Vec<ScanRecord>) -> bool {
        let live = self.live.lock().expect(LOCK_POISONED);
        match live.values().next_back() {
            Some(scan) => {
                let records = records
                    .into_iter()
                    .filter(|r| Self::passes(&scan.filters, r))
                    .collect();
                scan.callbacks.on_batch_results(records)
            }
            None => false,
        }
    }

    /// Report a failure on the most recent live scan.
    pub fn fail_scan(&self, code: impl Into<ScanFailureCode>) -> bool {
        let live = self.live.lock().expect(LOCK_POISONED);
        match live.values().next_back() {
            Some(scan) => scan.callbacks.on_failed(code),
            None => false,
        }
    }

    /// Clone of the callbacks given to the most recent live scan.
    pub fn callbacks_for_latest(&self) -> Option<ScanCallbacks> {
        let live = self.live.lock().expect(LOCK_POISONED);
        live.values().next_back().map(|s| s.callbacks.clone())
    }

    // --- Inspection ---

    /// Number of `start_scan` calls, including failed ones.
    pub fn start_count(&self) -> u32 {
        self.start_calls.load(Ordering::Relaxed)
    }

    /// Number of `stop_scan` calls, including failed ones.
    pub fn stop_count(&self) -> u32 {
        self.stop_calls.load(Ordering::Relaxed)
    }

    /// Number of handles started and not yet stopped.
    pub fn live_scans(&self) -> usize {
        self.live.lock().expect(LOCK_POISONED).len()
    }

    /// Filters passed to the most recent `start_scan`.
    pub fn last_filters(&self) -> Option<Vec<ServiceId>> {
        self.last_start
            .lock()
            .expect(LOCK_POISONED)
            .as_ref()
            .map(|(filters, _)| filters.clone())
    }

    /// Mode passed to the most recent `start_scan`.
    pub fn last_mode(&self) -> Option<ScanMode> {
        self.last_start
            .lock()
            .expect(LOCK_POISONED)
            .as_ref()
            .map(|(_, mode)| *mode)
    }

    fn passes(filters: &[ServiceId], record: &ScanRecord) -> bool {
        filters.is_empty() || filters.iter().any(|f| record.advertises(f))
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn start_scan(
        &self,
        filters: &[ServiceId],
        mode: ScanMode,
        callbacks: ScanCallbacks,
    ) -> Result<ScanHandle> {
        self.start_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_start.lock().expect(LOCK_POISONED) = Some((filters.to_vec(), mode));

        if let Some(failure) = self.fail_next_start.lock().expect(LOCK_POISONED).take() {
            return Err(match failure {
                StartFailure::Security(msg) => Error::Security(msg),
                StartFailure::Other(msg) => Error::Bluetooth(btleplug::Error::RuntimeError(msg)),
            });
        }

        let id = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        self.live.lock().expect(LOCK_POISONED).insert(
            id,
            LiveScan {
                filters: filters.to_vec(),
                mode,
                callbacks,
            },
        );
        Ok(ScanHandle::new(id))
    }

    async fn stop_scan(&self, handle: ScanHandle) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::Relaxed);
        let removed = self.live.lock().expect(LOCK_POISONED).remove(&handle.id());
        if self.fail_stop.load(Ordering::Relaxed) {
            return Err(Error::Bluetooth(btleplug::Error::RuntimeError(
                "mock stop failure".to_string(),
            )));
        }
        match removed {
            Some(scan) => {
                tracing::debug!(handle = handle.id(), mode = %scan.mode, "Mock scan stopped");
                Ok(())
            }
            None => Err(Error::UnknownHandle(handle.id())),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn callbacks() -> (ScanCallbacks, mpsc::UnboundedReceiver<crate::callbacks::ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ScanCallbacks::new(1, tx), rx)
    }

    #[tokio::test]
    async fn test_adapter_status_control() {
        let adapter = MockAdapter::new(Arc::new(MockScanner::new()));
        assert_eq!(adapter.status().await, AdapterStatus::ready());

        adapter.set_status(AdapterStatus::disabled());
        assert_eq!(adapter.status().await, AdapterStatus::disabled());

        adapter.set_scanner_available(false);
        assert!(adapter.scanner().await.is_none());
    }

    #[tokio::test]
    async fn test_start_stop_accounting() {
        let scanner = MockScanner::new();
        let (cb, _rx) = callbacks();

        let handle = scanner
            .start_scan(&[], ScanMode::Balanced, cb)
            .await
            .unwrap();
        assert_eq!(scanner.live_scans(), 1);
        assert_eq!(scanner.last_mode(), Some(ScanMode::Balanced));

        scanner.stop_scan(handle).await.unwrap();
        assert_eq!(scanner.live_scans(), 0);
        assert_eq!(scanner.start_count(), 1);
        assert_eq!(scanner.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_unknown_handle() {
        let scanner = MockScanner::new();
        let err = scanner.stop_scan(ScanHandle::new(99)).await.unwrap_err();
        assert!(matches!(err, Error::UnknownHandle(99)));
    }

    #[tokio::test]
    async fn test_injected_start_failure_is_one_shot() {
        let scanner = MockScanner::new();
        scanner.fail_next_start_with_security("nope");

        let (cb, _rx) = callbacks();
        let err = scanner.start_scan(&[], ScanMode::LowLatency, cb.clone()).await;
        assert!(matches!(err, Err(Error::Security(_))));
        assert!(scanner.start_scan(&[], ScanMode::LowLatency, cb).await.is_ok());
    }

    #[tokio::test]
    async fn test_emit_applies_filter() {
        let scanner = MockScanner::new();
        let (cb, mut rx) = callbacks();
        let battery = ServiceId::from_short(0x180F);
        scanner
            .start_scan(&[battery], ScanMode::LowLatency, cb)
            .await
            .unwrap();

        assert!(!scanner.emit(ScanRecord::new("A", -40)));
        assert!(scanner.emit(ScanRecord::new("B", -40).with_service(battery)));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_live_scan() {
        let scanner = MockScanner::new();
        assert!(!scanner.emit(ScanRecord::new("A", -40)));
        assert!(!scanner.fail_scan(3));
        assert!(scanner.callbacks_for_latest().is_none());
    }
}
