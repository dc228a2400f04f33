//! Scan session lifecycle and device deduplication.
//!
//! A [`ScanSession`] owns one start-to-stop cycle of device discovery at a
//! time. It checks preconditions, starts the platform scan, filters repeated
//! reports of the same address, and tells its observer what happened.
//!
//! # Threading
//!
//! The session is driven from a single task. Scanners report through
//! [`ScanCallbacks`], which only post messages; the owner applies them by
//! calling [`ScanSession::next_event`], [`ScanSession::process_pending`] or
//! [`ScanSession::run_until_cancelled`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use blescan_core::{CapabilitySet, ScanSession, scan::BtleAdapter};
//!
//! let adapter = Arc::new(BtleAdapter::first().await?);
//! let mut session = ScanSession::new(adapter, Arc::new(CapabilitySet::all()));
//!
//! session.start_unfiltered(my_observer).await?;
//! session.run_until_cancelled(&cancel).await;
//! session.stop().await;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use blescan_types::{
    Capability, DiscoveredDevice, ScanFailureCode, ScanMode, ScanRecord, ServiceId,
};

use crate::callbacks::{ScanCallbacks, ScanEvent, ScanEventKind, ScanHandle};
use crate::error::ScanError;
use crate::traits::{Capabilities, RadioAdapter, ScanObserver, Scanner};

/// Status text reported while an unfiltered scan runs.
pub const STATUS_SCANNING: &str = "Scanning for devices...";

/// Status text reported after [`ScanSession::stop`].
pub const STATUS_STOPPED: &str = "Scan stopped";

/// Status text reported after a failed start or a failed scan.
pub const STATUS_FAILED: &str = "Scan failed";

/// The scan currently owned by the session.
struct ActiveScan {
    scanner: Arc<dyn Scanner>,
    handle: ScanHandle,
}

/// One scan at a time, with per-session address deduplication.
pub struct ScanSession {
    adapter: Arc<dyn RadioAdapter>,
    capabilities: Arc<dyn Capabilities>,
    observer: Option<Box<dyn ScanObserver>>,
    running: bool,
    seen_addresses: HashSet<String>,
    active_filter: Option<ServiceId>,
    active: Option<ActiveScan>,
    /// Bumped on every successful start; callbacks carry the value they were
    /// created with.
    generation: u64,
    events_tx: mpsc::UnboundedSender<ScanEvent>,
    events_rx: mpsc::UnboundedReceiver<ScanEvent>,
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("running", &self.running)
            .field("seen", &self.seen_addresses.len())
            .field("active_filter", &self.active_filter)
            .field("generation", &self.generation)
            .finish()
    }
}

impl ScanSession {
    /// Create an idle session bound to a host adapter and capability predicate.
    pub fn new(adapter: Arc<dyn RadioAdapter>, capabilities: Arc<dyn Capabilities>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            adapter,
            capabilities,
            observer: None,
            running: false,
            seen_addresses: HashSet::new(),
            active_filter: None,
            active: None,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Whether the platform scan is believed to be delivering results.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the session still holds a scan handle that `stop` would release.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Service filter of the current scan, if any.
    pub fn active_filter(&self) -> Option<ServiceId> {
        self.active_filter
    }

    /// Number of distinct addresses reported since the last start.
    pub fn seen_count(&self) -> usize {
        self.seen_addresses.len()
    }

    /// Start scanning for every advertising device.
    pub async fn start_unfiltered(
        &mut self,
        observer: impl ScanObserver + 'static,
    ) -> Result<(), ScanError> {
        self.start(None, Box::new(observer)).await
    }

    /// Start scanning for devices advertising `service`.
    pub async fn start_filtered(
        &mut self,
        service: ServiceId,
        observer: impl ScanObserver + 'static,
    ) -> Result<(), ScanError> {
        self.start(Some(service), Box::new(observer)).await
    }

    /// Stop the current scan.
    ///
    /// Does nothing when no scan is active. Failures of the underlying stop are
    /// logged and swallowed, and the call is skipped entirely if the scan
    /// capability has been revoked in the meantime.
    ///
    /// A scan that already failed still has its handle released, but the
    /// observer hears nothing more: the failure was its terminal state.
    pub async fn stop(&mut self) {
        if self.active.is_none() {
            debug!("stop() called with no active scan");
            return;
        }
        let was_running = self.running;
        self.release().await;
        self.active_filter = None;
        if was_running {
            info!("Scan stopped");
            self.notify_state(false, STATUS_STOPPED);
        } else {
            debug!("Released handle of a failed scan");
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(filter = ?filter))]
    async fn start(
        &mut self,
        filter: Option<ServiceId>,
        observer: Box<dyn ScanObserver>,
    ) -> Result<(), ScanError> {
        self.observer = Some(observer);

        let scanner = match self.check_preconditions().await {
            Ok(scanner) => scanner,
            Err(err) => {
                // Whatever ran before is no longer trustworthy once the
                // radio or permission went away.
                self.release().await;
                self.active_filter = None;
                return Err(self.fail(err));
            }
        };

        self.release().await;
        self.generation += 1;
        let callbacks = ScanCallbacks::new(self.generation, self.events_tx.clone());
        let filters: Vec<ServiceId> = filter.into_iter().collect();

        match scanner
            .start_scan(&filters, ScanMode::LowLatency, callbacks)
            .await
        {
            Ok(handle) => {
                info!(
                    handle = handle.id(),
                    generation = self.generation,
                    "Scan started"
                );
                self.active = Some(ActiveScan { scanner, handle });
                self.active_filter = filter;
                self.running = true;
                let status = match filter {
                    Some(service) => format!("Scanning for {} devices...", service),
                    None => STATUS_SCANNING.to_string(),
                };
                self.notify_state(true, &status);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to start scan: {}", err);
                self.active_filter = None;
                Err(self.fail(ScanError::from(err)))
            }
        }
    }

    /// Adapter exists, adapter on, scan permission, scanner obtainable.
    async fn check_preconditions(&self) -> Result<Arc<dyn Scanner>, ScanError> {
        let status = self.adapter.status().await;
        if !status.present {
            return Err(ScanError::AdapterMissing);
        }
        if !status.enabled {
            return Err(ScanError::AdapterDisabled);
        }
        if !self.capabilities.has_capability(Capability::Scan) {
            return Err(ScanError::PermissionMissing);
        }
        self.adapter
            .scanner()
            .await
            .ok_or(ScanError::ScannerUnavailable)
    }

    /// Drop the current handle, stopping the platform scan when allowed,
    /// and reset the per-session state. Reports nothing to the observer.
    async fn release(&mut self) {
        self.running = false;
        self.seen_addresses.clear();

        let Some(active) = self.active.take() else {
            return;
        };
        if !self.capabilities.has_capability(Capability::Scan) {
            warn!(
                handle = active.handle.id(),
                "Scan permission missing, skipping platform stop"
            );
            return;
        }
        let id = active.handle.id();
        if let Err(e) = active.scanner.stop_scan(active.handle).await {
            warn!(handle = id, "Failed to stop scan: {}", e);
        }
    }

    /// Wait for the next callback and apply it.
    ///
    /// Returns `false` if the callback channel has closed.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply every callback already queued without waiting.
    ///
    /// Returns the number of callbacks applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Apply callbacks until `cancel` fires or the scan stops running.
    ///
    /// Returns immediately if no scan is running.
    pub async fn run_until_cancelled(&mut self, cancel: &CancellationToken) {
        while self.running {
            tokio::select! {
                _ = cancel.cancelled() => break,
                more = self.next_event() => {
                    if !more {
                        break;
                    }
                }
            }
        }
    }

    fn handle_event(&mut self, event: ScanEvent) {
        if event.generation != self.generation {
            debug!(
                stale = event.generation,
                current = self.generation,
                "Dropping callback from a replaced scan"
            );
            return;
        }
        match event.kind {
            ScanEventKind::Result(record) => self.on_discovery(record),
            ScanEventKind::BatchResults(records) => {
                for record in records {
                    self.on_discovery(record);
                }
            }
            ScanEventKind::Failed(code) => self.on_scan_failed(code),
        }
    }

    fn on_discovery(&mut self, record: ScanRecord) {
        if !self.running {
            return;
        }
        let address = record.resolved_address();
        if self.seen_addresses.contains(address) {
            return;
        }
        self.seen_addresses.insert(address.to_string());

        let name_readable = self.capabilities.has_capability(Capability::Connect);
        let device = DiscoveredDevice::from_record(&record, name_readable);
        debug!(address = %device.address, rssi = device.signal_strength, "Device found");
        if let Some(observer) = self.observer.as_mut() {
            observer.on_device_found(&device);
        }
    }

    fn on_scan_failed(&mut self, code: ScanFailureCode) {
        warn!("Scan failed: {}", code);
        self.running = false;
        self.fail(ScanError::ScanFailed(code));
    }

    /// Report a terminal error and return it.
    fn fail(&mut self, err: ScanError) -> ScanError {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_scan_error(&err.to_string());
            observer.on_scan_state_changed(false, STATUS_FAILED);
        }
        err
    }

    fn notify_state(&mut self, is_scanning: bool, status: &str) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_scan_state_changed(is_scanning, status);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use blescan_types::AdapterStatus;

    use super::*;
    use crate::capabilities::CapabilitySet;
    use crate::mock::{MockAdapter, MockScanner};

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        State(bool, String),
        Device(String),
        Error(String),
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Seen>>>);

    impl Recorder {
        fn take(&self) -> Vec<Seen> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl ScanObserver for Recorder {
        fn on_scan_state_changed(&mut self, is_scanning: bool, status: &str) {
            self.0
                .lock()
                .unwrap()
                .push(Seen::State(is_scanning, status.to_string()));
        }

        fn on_device_found(&mut self, device: &DiscoveredDevice) {
            self.0.lock().unwrap().push(Seen::Device(device.to_string()));
        }

        fn on_scan_error(&mut self, message: &str) {
            self.0.lock().unwrap().push(Seen::Error(message.to_string()));
        }
    }

    fn fixture() -> (ScanSession, Arc<MockAdapter>, Arc<MockScanner>, Arc<CapabilitySet>) {
        let scanner = Arc::new(MockScanner::new());
        let adapter = Arc::new(MockAdapter::new(Arc::clone(&scanner)));
        let caps = Arc::new(CapabilitySet::all());
        let session = ScanSession::new(adapter.clone(), caps.clone());
        (session, adapter, scanner, caps)
    }

    #[tokio::test]
    async fn test_start_reports_scanning() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();

        session.start_unfiltered(rec.clone()).await.unwrap();

        assert!(session.is_running());
        assert_eq!(scanner.start_count(), 1);
        assert_eq!(scanner.last_mode(), Some(ScanMode::LowLatency));
        assert_eq!(scanner.last_filters(), Some(vec![]));
        assert_eq!(
            rec.take(),
            vec![Seen::State(true, STATUS_SCANNING.to_string())]
        );
    }

    #[tokio::test]
    async fn test_precondition_order() {
        let (mut session, adapter, scanner, caps) = fixture();
        let rec = Recorder::default();

        // Every check fails: the first one wins.
        adapter.set_status(AdapterStatus::missing());
        caps.revoke(Capability::Scan);
        adapter.set_scanner_available(false);
        let err = session.start_unfiltered(rec.clone()).await.unwrap_err();
        assert_eq!(err, ScanError::AdapterMissing);

        adapter.set_status(AdapterStatus::disabled());
        let err = session.start_unfiltered(rec.clone()).await.unwrap_err();
        assert_eq!(err, ScanError::AdapterDisabled);

        adapter.set_status(AdapterStatus::ready());
        let err = session.start_unfiltered(rec.clone()).await.unwrap_err();
        assert_eq!(err, ScanError::PermissionMissing);

        caps.grant(Capability::Scan);
        let err = session.start_unfiltered(rec.clone()).await.unwrap_err();
        assert_eq!(err, ScanError::ScannerUnavailable);

        assert_eq!(scanner.start_count(), 0);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_precondition_failure_reports_error_then_state() {
        let (mut session, adapter, _scanner, _caps) = fixture();
        let rec = Recorder::default();
        adapter.set_status(AdapterStatus::disabled());

        let _ = session.start_unfiltered(rec.clone()).await;

        assert_eq!(
            rec.take(),
            vec![
                Seen::Error("Bluetooth is turned off".to_string()),
                Seen::State(false, STATUS_FAILED.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dedup_within_session() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        scanner.emit(ScanRecord::new("A", -40).with_advertised_name("Alpha"));
        scanner.emit(ScanRecord::new("B", -50));
        scanner.emit(ScanRecord::new("A", -45).with_advertised_name("Alpha"));
        assert_eq!(session.process_pending(), 3);

        assert_eq!(
            rec.take(),
            vec![
                Seen::Device("Alpha (A) RSSI: -40 dBm".to_string()),
                Seen::Device("(no name) (B) RSSI: -50 dBm".to_string()),
            ]
        );
        assert_eq!(session.seen_count(), 2);
    }

    #[tokio::test]
    async fn test_batch_results_are_deduplicated() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        scanner.emit_batch(vec![
            ScanRecord::new("A", -40),
            ScanRecord::new("A", -41),
            ScanRecord::new("C", -42),
        ]);
        session.process_pending();

        let devices: Vec<_> = rec
            .take()
            .into_iter()
            .filter(|s| matches!(s, Seen::Device(_)))
            .collect();
        assert_eq!(devices.len(), 2);
    }

    #[tokio::test]
    async fn test_restart_clears_seen_and_replaces_handle() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        scanner.emit(ScanRecord::new("A", -40));
        session.process_pending();

        session.start_unfiltered(rec.clone()).await.unwrap();
        assert_eq!(scanner.start_count(), 2);
        assert_eq!(scanner.stop_count(), 1);
        assert_eq!(scanner.live_scans(), 1);
        assert_eq!(session.seen_count(), 0);

        rec.take();
        scanner.emit(ScanRecord::new("A", -40));
        session.process_pending();
        assert_eq!(rec.take().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_is_silent_about_first_scan() {
        let (mut session, _adapter, _scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        session.start_unfiltered(rec.clone()).await.unwrap();
        assert_eq!(
            rec.take(),
            vec![Seen::State(true, STATUS_SCANNING.to_string())]
        );
    }

    #[tokio::test]
    async fn test_stale_generation_is_dropped() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        let old = scanner.callbacks_for_latest().unwrap();

        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        old.on_result(ScanRecord::new("Z", -30));
        old.on_failed(3);
        session.process_pending();

        assert!(rec.take().is_empty());
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_silent() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        session.stop().await;
        session.stop().await;
        assert_eq!(scanner.stop_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_reports_and_resets() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        session.stop().await;
        assert_eq!(scanner.stop_count(), 1);
        assert!(!session.is_running());
        assert!(!session.is_active());
        assert_eq!(
            rec.take(),
            vec![Seen::State(false, STATUS_STOPPED.to_string())]
        );

        // Second stop is a no-op.
        session.stop().await;
        assert!(rec.take().is_empty());
    }

    #[tokio::test]
    async fn test_stop_after_scan_failure_is_silent() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        scanner.fail_scan(ScanFailureCode::InternalError);
        session.process_pending();
        rec.take();

        session.stop().await;

        assert!(rec.take().is_empty());
        assert_eq!(scanner.stop_count(), 1);
        assert_eq!(scanner.live_scans(), 0);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_stop_without_permission_skips_platform_call() {
        let (mut session, _adapter, scanner, caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();

        caps.revoke(Capability::Scan);
        session.stop().await;

        assert_eq!(scanner.stop_count(), 0);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_stop_failure_is_swallowed() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        session.start_unfiltered(Recorder::default()).await.unwrap();
        scanner.set_fail_stop(true);

        session.stop().await;
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_results_after_stop_are_ignored() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        let callbacks = scanner.callbacks_for_latest().unwrap();
        session.stop().await;
        rec.take();

        callbacks.on_result(ScanRecord::new("A", -40));
        session.process_pending();
        assert!(rec.take().is_empty());
    }

    #[tokio::test]
    async fn test_scan_failure_always_reported() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        let callbacks = scanner.callbacks_for_latest().unwrap();
        rec.take();

        callbacks.on_failed(ScanFailureCode::OutOfHardwareResources);
        callbacks.on_failed(ScanFailureCode::InternalError);
        session.process_pending();

        let seen = rec.take();
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen[0],
            Seen::Error("Scan failed: out of hardware resources (code 5)".to_string())
        );
        assert_eq!(seen[1], Seen::State(false, STATUS_FAILED.to_string()));
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_security_error_on_start_maps_to_permission() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        scanner.fail_next_start_with_security("scan permission revoked");

        let err = session
            .start_unfiltered(Recorder::default())
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::PermissionMissing);
        assert!(!session.is_running());
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_filtered_start_passes_filter() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        let hr = ServiceId::from_short(0x180D);

        session.start_filtered(hr, rec.clone()).await.unwrap();

        assert_eq!(scanner.last_filters(), Some(vec![hr]));
        assert_eq!(session.active_filter(), Some(hr));
        assert_eq!(
            rec.take(),
            vec![Seen::State(true, "Scanning for 0x180D devices...".to_string())]
        );
    }

    #[tokio::test]
    async fn test_name_requires_connect_capability() {
        let (mut session, _adapter, scanner, caps) = fixture();
        let rec = Recorder::default();
        caps.revoke(Capability::Connect);
        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        scanner.emit(
            ScanRecord::new("A", -40)
                .with_name("Kitchen")
                .with_advertised_name("KT-01"),
        );
        session.process_pending();

        assert_eq!(
            rec.take(),
            vec![Seen::Device("KT-01 (A) RSSI: -40 dBm".to_string())]
        );
    }

    #[tokio::test]
    async fn test_run_until_cancelled() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        let rec = Recorder::default();
        session.start_unfiltered(rec.clone()).await.unwrap();
        rec.take();

        scanner.emit(ScanRecord::new("A", -40));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });
        session.run_until_cancelled(&cancel).await;

        assert_eq!(session.seen_count(), 1);
    }

    #[tokio::test]
    async fn test_run_returns_after_scan_failure() {
        let (mut session, _adapter, scanner, _caps) = fixture();
        session.start_unfiltered(Recorder::default()).await.unwrap();

        scanner.fail_scan(ScanFailureCode::InternalError);
        // Never cancelled: the failure alone ends the loop.
        session.run_until_cancelled(&CancellationToken::new()).await;

        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_run_when_idle_returns_immediately() {
        let (mut session, _adapter, _scanner, _caps) = fixture();
        session.run_until_cancelled(&CancellationToken::new()).await;
        assert!(!session.is_running());
    }
}
