//! Callback surface handed to scanners.
//!
//! Scanners deliver results from whatever thread or task the radio stack
//! uses. [`ScanCallbacks`] turns each call into a message on the owning
//! session's channel; the session applies them later on its own task, so the
//! deduplication set is never touched concurrently.

use tokio::sync::mpsc;

use blescan_types::{ScanFailureCode, ScanRecord};

/// Opaque handle for a running platform scan.
///
/// Owned exclusively by the session that started the scan and given back to
/// the scanner to stop it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ScanHandle(u64);

impl ScanHandle {
    /// Wrap a scanner-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The scanner-assigned id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A callback posted to the session's channel.
#[derive(Debug)]
pub(crate) struct ScanEvent {
    pub(crate) generation: u64,
    pub(crate) kind: ScanEventKind,
}

#[derive(Debug)]
pub(crate) enum ScanEventKind {
    Result(ScanRecord),
    BatchResults(Vec<ScanRecord>),
    Failed(ScanFailureCode),
}

/// Sender side of a session's discovery callbacks.
///
/// Cheap to clone and safe to call from any thread. Every call is tagged with
/// the generation of the scan it was created for, so results from a scan that
/// has since been replaced are dropped by the session.
#[derive(Debug, Clone)]
pub struct ScanCallbacks {
    generation: u64,
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ScanCallbacks {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        Self { generation, tx }
    }

    /// The scan generation these callbacks belong to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report a single discovered advertisement.
    ///
    /// Returns `false` once the session is gone.
    pub fn on_result(&self, record: ScanRecord) -> bool {
        self.post(ScanEventKind::Result(record))
    }

    /// Report a batch of advertisements collected by the controller.
    pub fn on_batch_results(&self, records: Vec<ScanRecord>) -> bool {
        self.post(ScanEventKind::BatchResults(records))
    }

    /// Report that the running scan failed.
    pub fn on_failed(&self, code: impl Into<ScanFailureCode>) -> bool {
        self.post(ScanEventKind::Failed(code.into()))
    }

    /// Whether the receiving session has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn post(&self, kind: ScanEventKind) -> bool {
        self.tx
            .send(ScanEvent {
                generation: self.generation,
                kind,
            })
            .is_ok()
    }
}
