//! Scan command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use blescan_core::scan::BtleAdapter;
use blescan_core::{CapabilitySet, QueueObserver, QueueReceiver, ScanSession, SessionEvent};
use blescan_types::{DiscoveredDevice, ServiceId};
use indicatif::ProgressBar;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::format::{format_device_line, format_scan_json, format_scan_text};
use crate::style;
use crate::util::write_output;

/// Resolved arguments for a scan.
#[derive(Debug, Clone)]
pub struct ScanArgs {
    pub timeout: u64,
    pub service: Option<ServiceId>,
    pub format: OutputFormat,
    pub compact: bool,
}

/// Everything the session reported by the time it closed.
#[derive(Debug, Default)]
struct Collected {
    devices: Vec<DiscoveredDevice>,
    errors: Vec<String>,
}

/// Live output settings for the printer task.
#[derive(Clone)]
struct LivePrinter {
    spinner: Option<ProgressBar>,
    print_devices: bool,
    no_color: bool,
}

pub async fn cmd_scan(
    args: &ScanArgs,
    output: Option<&PathBuf>,
    quiet: bool,
    no_color: bool,
) -> Result<()> {
    let text = args.format == OutputFormat::Text;

    // Show spinner for text output (unless quiet)
    let spinner = if !quiet && text {
        Some(style::scanning_spinner(args.timeout, args.service.as_ref()))
    } else {
        None
    };

    let adapter = BtleAdapter::first()
        .await
        .context("Failed to initialize Bluetooth")?;
    let mut session = ScanSession::new(Arc::new(adapter), Arc::new(CapabilitySet::all()));

    let (observer, events) = QueueObserver::new();
    let printer = tokio::spawn(collect_events(
        events,
        LivePrinter {
            spinner: spinner.clone(),
            print_devices: text && output.is_none(),
            no_color,
        },
    ));

    let started = match args.service {
        Some(service) => session.start_filtered(service, observer).await,
        None => session.start_unfiltered(observer).await,
    };

    if started.is_ok() {
        let cancel = CancellationToken::new();
        let stopper = spawn_stopper(Duration::from_secs(args.timeout), cancel.clone());
        session.run_until_cancelled(&cancel).await;
        stopper.abort();
        session.stop().await;
    }

    // Dropping the session drops the observer, which closes the channel.
    drop(session);
    let collected = printer.await.context("Event printer task failed")?;

    // Clear spinner before output
    if let Some(sp) = &spinner {
        sp.finish_and_clear();
    }

    if let Err(err) = started {
        if !quiet {
            let suggestions: Vec<&str> = err.remediation().into_iter().collect();
            eprintln!(
                "{}",
                style::format_error_box("Scan failed", &err.to_string(), &suggestions)
            );
        }
        return Err(anyhow::Error::new(err).context("Failed to start scan"));
    }

    match args.format {
        OutputFormat::Json => {
            let content =
                format_scan_json(&collected.devices, args.service.as_ref(), args.compact)?;
            write_output(output, &content)?;
        }
        OutputFormat::Text if output.is_some() => {
            write_output(output, &format_scan_text(&collected.devices, true))?;
        }
        OutputFormat::Text => {
            if !quiet {
                println!();
                if collected.devices.is_empty() {
                    println!("{}", style::format_warning("No devices found.", no_color));
                } else {
                    let msg = format!("Found {} device(s)", collected.devices.len());
                    println!("{}", style::format_success(&msg, no_color));
                }
            }
        }
    }

    if !collected.errors.is_empty() {
        for message in &collected.errors {
            eprintln!("{}", style::format_error(message, no_color));
        }
        bail!("Scan ended early after a platform failure");
    }

    Ok(())
}

/// Cancel `cancel` after `duration` or on Ctrl-C, whichever comes first.
fn spawn_stopper(duration: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interrupted = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => debug!("Interrupted, stopping scan"),
                Err(e) => {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(duration) => debug!("Scan duration elapsed"),
            _ = interrupted => {}
        }
        cancel.cancel();
    })
}

/// Drain session events until the channel closes.
async fn collect_events(mut rx: QueueReceiver, live: LivePrinter) -> Collected {
    let mut collected = Collected::default();
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::DeviceFound { device, .. } => {
                if live.print_devices {
                    style::print_suspended_stdout(
                        live.spinner.as_ref(),
                        &format_device_line(&device, live.no_color),
                    );
                }
                collected.devices.push(device);
            }
            SessionEvent::ScanStateChanged { scanning, status } => {
                debug!(scanning, %status, "Scan state changed");
            }
            SessionEvent::ScanError { message } => collected.errors.push(message),
            other => debug!(?other, "Ignoring session event"),
        }
    }
    collected
}
