//! Integration tests for blescan-core
//!
//! These tests require actual BLE hardware and should be run with:
//! `cargo test --package blescan-core --test integration -- --ignored --nocapture`
//!
//! Set the BLESCAN_TEST_SERVICE environment variable to exercise a filtered
//! scan against a service you know is advertised nearby:
//! `BLESCAN_TEST_SERVICE=heart-rate cargo test --package blescan-core -- --ignored`

use std::env;
use std::sync::Arc;
use std::time::Duration;

use blescan_core::scan::BtleAdapter;
use blescan_core::{
    CapabilitySet, EventObserver, RadioAdapter, ScanSession, ServiceId, SessionEvent,
};
use tokio_util::sync::CancellationToken;

/// How long each hardware scan runs.
const SCAN_DURATION: Duration = Duration::from_secs(10);

/// Get the service filter from environment, if any.
fn get_service() -> Option<ServiceId> {
    env::var("BLESCAN_TEST_SERVICE")
        .ok()
        .map(|s| s.parse().expect("BLESCAN_TEST_SERVICE is not a valid service"))
}

async fn run_scan(filter: Option<ServiceId>) -> Vec<SessionEvent> {
    let adapter = Arc::new(BtleAdapter::first().await.expect("Bluetooth manager"));
    let mut session = ScanSession::new(adapter, Arc::new(CapabilitySet::all()));
    let observer = EventObserver::new(1024);
    let mut rx = observer.subscribe();

    let started = match filter {
        Some(service) => session.start_filtered(service, observer).await,
        None => session.start_unfiltered(observer).await,
    };
    started.expect("scan should start");

    let cancel = CancellationToken::new();
    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(SCAN_DURATION).await;
        timer.cancel();
    });
    session.run_until_cancelled(&cancel).await;
    session.stop().await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_adapter_is_ready() {
    let adapter = BtleAdapter::first().await.expect("Bluetooth manager");
    let status = adapter.status().await;
    println!("Adapter: {:?} ({:?})", adapter.info().await, status);
    assert!(status.present, "no Bluetooth adapter");
    assert!(status.enabled, "Bluetooth is off");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_unfiltered_scan_reports_each_device_once() {
    let events = run_scan(None).await;

    let mut seen = std::collections::HashSet::new();
    for event in &events {
        if let SessionEvent::DeviceFound { device, line } = event {
            println!("  {}", line);
            assert!(seen.insert(device.address.clone()), "duplicate {}", line);
        }
    }
    println!("Found {} devices", seen.len());
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_filtered_scan() {
    let Some(service) = get_service() else {
        println!("BLESCAN_TEST_SERVICE not set, skipping");
        return;
    };
    let events = run_scan(Some(service)).await;
    assert!(matches!(
        events.first(),
        Some(SessionEvent::ScanStateChanged { scanning: true, .. })
    ));
}
