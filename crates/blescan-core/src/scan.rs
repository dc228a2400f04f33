//! btleplug host.
//!
//! [`BtleAdapter`] and [`BtleScanner`] implement the host traits on top of
//! the system Bluetooth stack. Each started scan gets its own event-stream
//! task; stopping the scan cancels that task and stops the adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use blescan_types::{AdapterStatus, ScanFailureCode, ScanMode, ScanRecord, ServiceId};

use crate::callbacks::{ScanCallbacks, ScanHandle};
use crate::error::{Error, Result};
use crate::traits::{RadioAdapter, Scanner};
use crate::util::{address_or_else, format_peripheral_id, record_from_properties};

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// The system's first Bluetooth adapter, or the absence of one.
#[derive(Debug, Clone)]
pub struct BtleAdapter {
    adapter: Option<Adapter>,
    scanner: Option<Arc<BtleScanner>>,
}

impl BtleAdapter {
    /// Look up the first adapter.
    ///
    /// A machine without an adapter is not an error here: the resulting
    /// value reports itself as missing through [`RadioAdapter::status`].
    /// Fails only when the Bluetooth manager itself cannot be created.
    pub async fn first() -> Result<Self> {
        match get_adapter().await {
            Ok(adapter) => Ok(Self::from_adapter(adapter)),
            Err(Error::NoAdapter) => {
                warn!("No Bluetooth adapter found");
                Ok(Self {
                    adapter: None,
                    scanner: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Wrap an adapter obtained elsewhere.
    pub fn from_adapter(adapter: Adapter) -> Self {
        let scanner = Arc::new(BtleScanner::new(adapter.clone()));
        Self {
            adapter: Some(adapter),
            scanner: Some(scanner),
        }
    }

    /// Platform description of the adapter, if there is one.
    pub async fn info(&self) -> Option<String> {
        let adapter = self.adapter.as_ref()?;
        match adapter.adapter_info().await {
            Ok(info) => Some(info),
            Err(e) => {
                debug!("Failed to read adapter info: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl RadioAdapter for BtleAdapter {
    async fn status(&self) -> AdapterStatus {
        let Some(adapter) = &self.adapter else {
            return AdapterStatus::missing();
        };
        // Only an explicit "off" counts as disabled; stacks that cannot tell
        // are given the benefit of the doubt and fail later at start.
        match adapter.adapter_state().await {
            Ok(CentralState::PoweredOff) => AdapterStatus::disabled(),
            Ok(state) => {
                debug!(?state, "Adapter state");
                AdapterStatus::ready()
            }
            Err(e) => {
                debug!("Failed to read adapter state: {}", e);
                AdapterStatus::ready()
            }
        }
    }

    async fn scanner(&self) -> Option<Arc<dyn Scanner>> {
        self.scanner
            .as_ref()
            .map(|scanner| Arc::clone(scanner) as Arc<dyn Scanner>)
    }
}

/// Scanner backed by a btleplug [`Adapter`].
#[derive(Debug)]
pub struct BtleScanner {
    adapter: Adapter,
    next_handle: AtomicU64,
    tasks: Mutex<HashMap<u64, CancellationToken>>,
}

impl BtleScanner {
    /// Create a scanner for `adapter`.
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            next_handle: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Scanner for BtleScanner {
    #[tracing::instrument(level = "debug", skip(self, callbacks), fields(generation = callbacks.generation()))]
    async fn start_scan(
        &self,
        filters: &[ServiceId],
        mode: ScanMode,
        callbacks: ScanCallbacks,
    ) -> Result<ScanHandle> {
        // Subscribe before starting so the first advertisements are not lost.
        let events = self.adapter.events().await?;

        let filter = ScanFilter {
            services: filters.iter().map(ServiceId::uuid).collect(),
        };
        // btleplug has no scan-mode knob; desktop stacks pick their own duty cycle.
        debug!(%mode, "Requested scan mode");
        self.adapter.start_scan(filter).await?;

        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.tasks
            .lock()
            .expect("scanner lock poisoned - a thread panicked while holding the lock")
            .insert(id, token.clone());

        let adapter = self.adapter.clone();
        let filter_count = filters.len();
        let filters = filters.to_vec();
        tokio::spawn(async move {
            let mut events = events;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(handle = id, "Scan task cancelled");
                        break;
                    }
                    event = events.next() => match event {
                        Some(CentralEvent::DeviceDiscovered(peripheral_id))
                        | Some(CentralEvent::DeviceUpdated(peripheral_id)) => {
                            let Some(record) = read_record(&adapter, &peripheral_id).await else {
                                continue;
                            };
                            if !filters.is_empty() && !filters.iter().any(|f| record.advertises(f)) {
                                continue;
                            }
                            if !callbacks.on_result(record) {
                                debug!(handle = id, "Session gone, ending scan task");
                                break;
                            }
                        }
                        Some(_) => {}
                        None => {
                            warn!(handle = id, "Adapter event stream ended");
                            callbacks.on_failed(ScanFailureCode::InternalError);
                            break;
                        }
                    }
                }
            }
        });

        info!(handle = id, filters = filter_count, "BLE scan started");
        Ok(ScanHandle::new(id))
    }

    async fn stop_scan(&self, handle: ScanHandle) -> Result<()> {
        let (token, remaining) = {
            let mut tasks = self
                .tasks
                .lock()
                .expect("scanner lock poisoned - a thread panicked while holding the lock");
            let token = tasks
                .remove(&handle.id())
                .ok_or(Error::UnknownHandle(handle.id()))?;
            (token, tasks.len())
        };
        token.cancel();

        if remaining == 0 {
            self.adapter.stop_scan().await?;
        }
        info!(handle = handle.id(), "BLE scan stopped");
        Ok(())
    }
}

/// Read a peripheral's current properties as a scan record.
async fn read_record(adapter: &Adapter, id: &PeripheralId) -> Option<ScanRecord> {
    let peripheral = match adapter.peripheral(id).await {
        Ok(p) => p,
        Err(e) => {
            debug!("Peripheral lookup failed: {}", e);
            return None;
        }
    };
    let properties = match peripheral.properties().await {
        Ok(Some(p)) => p,
        Ok(None) => return None,
        Err(e) => {
            debug!("Error reading peripheral properties: {}", e);
            return None;
        }
    };
    let address = address_or_else(properties.address, || format_peripheral_id(id));
    Some(record_from_properties(address, &properties))
}
