//! Example: Scanning for nearby BLE devices
//!
//! Starts a scan session on the first Bluetooth adapter, prints every device
//! the first time it is seen, and stops after ten seconds. Pass a service
//! (`heart-rate`, `180D`, or a full UUID) to only list devices advertising it.
//!
//! Run with: `cargo run --example scan_devices [service]`

use std::sync::Arc;
use std::time::Duration;

use blescan_core::scan::BtleAdapter;
use blescan_core::{CapabilitySet, DiscoveredDevice, ScanObserver, ScanSession, ServiceId};
use tokio_util::sync::CancellationToken;

struct Printer;

impl ScanObserver for Printer {
    fn on_scan_state_changed(&mut self, _is_scanning: bool, status: &str) {
        println!("{}", status);
    }

    fn on_device_found(&mut self, device: &DiscoveredDevice) {
        println!("  {}", device);
    }

    fn on_scan_error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let filter = std::env::args()
        .nth(1)
        .map(|s| s.parse::<ServiceId>())
        .transpose()?;

    let adapter = Arc::new(BtleAdapter::first().await?);
    let mut session = ScanSession::new(adapter, Arc::new(CapabilitySet::all()));

    let started = match filter {
        Some(service) => session.start_filtered(service, Printer).await,
        None => session.start_unfiltered(Printer).await,
    };
    if let Err(e) = started {
        if let Some(hint) = e.remediation() {
            println!();
            println!("{}", hint);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        timer.cancel();
    });
    session.run_until_cancelled(&cancel).await;
    session.stop().await;

    println!();
    println!("Found {} device(s)", session.seen_count());
    Ok(())
}
