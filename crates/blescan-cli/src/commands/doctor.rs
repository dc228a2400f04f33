//! Doctor command implementation.
//!
//! Walks the same chain of checks a scan performs before it starts, then runs
//! a short scan, so users can see which step is failing.

use std::io::{Write, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use blescan_core::scan::BtleAdapter;
use blescan_core::{CapabilitySet, QueueObserver, RadioAdapter, ScanError, ScanSession, SessionEvent};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::style;

/// How long the trial scan runs.
const TRIAL_SCAN: Duration = Duration::from_secs(3);

const TOTAL_CHECKS: usize = 4;

/// Check result with status and message.
struct Check {
    passed: bool,
    warning: bool,
    message: String,
}

impl Check {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            warning: false,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            warning: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            warning: false,
            message: message.into(),
        }
    }
}

pub async fn cmd_doctor(verbose: bool, no_color: bool) -> Result<()> {
    println!(
        "{}",
        style::format_title("blescan doctor - BLE Diagnostics", no_color)
    );
    println!();

    let mut checks: Vec<Check> = Vec::new();
    let mut hint: Option<&'static str> = None;

    let adapter = match BtleAdapter::first().await {
        Ok(adapter) => Some(adapter),
        Err(e) => {
            print_check_start(1, "Bluetooth Adapter", no_color);
            let check = Check::fail(format!("Bluetooth stack unavailable ({})", e));
            print_check_result(&check, no_color);
            checks.push(check);
            None
        }
    };

    if let Some(adapter) = adapter {
        let status = adapter.status().await;

        // Check 1: adapter present
        print_check_start(1, "Bluetooth Adapter", no_color);
        let check = if status.present {
            match adapter.info().await {
                Some(info) => Check::pass(format!("Found ({})", info)),
                None => Check::pass("Found"),
            }
        } else {
            hint = ScanError::AdapterMissing.remediation();
            Check::fail(ScanError::AdapterMissing.to_string())
        };
        let ok = check.passed;
        print_check_result(&check, no_color);
        checks.push(check);

        // Check 2: adapter powered on
        if ok {
            print_check_start(2, "Bluetooth Power", no_color);
            let check = if status.enabled {
                Check::pass("On")
            } else {
                hint = ScanError::AdapterDisabled.remediation();
                Check::fail(ScanError::AdapterDisabled.to_string())
            };
            print_check_result(&check, no_color);
            checks.push(check);
        }

        // Check 3: scanner obtainable
        if status.is_ready() {
            print_check_start(3, "LE Scanner", no_color);
            let check = if adapter.scanner().await.is_some() {
                Check::pass("Available")
            } else {
                Check::fail(ScanError::ScannerUnavailable.to_string())
            };
            let ok = check.passed;
            print_check_result(&check, no_color);
            checks.push(check);

            // Check 4: a short scan, which also exercises permissions
            if ok {
                print_check_start(4, "Device Scan", no_color);
                let (check, scan_hint) = check_scan(adapter).await;
                hint = hint.or(scan_hint);
                print_check_result(&check, no_color);
                checks.push(check);
            }
        }
    }

    println!();
    println!("{}", "─".repeat(50));

    // Summary
    let passed = checks.iter().filter(|c| c.passed && !c.warning).count();
    let warnings = checks.iter().filter(|c| c.warning).count();
    let failed = checks.iter().filter(|c| !c.passed).count();

    let summary = if no_color {
        format!(
            "Summary: {} passed, {} warnings, {} failed",
            passed, warnings, failed
        )
    } else {
        format!(
            "Summary: {} passed, {} warnings, {} failed",
            format!("{}", passed).green(),
            format!("{}", warnings).yellow(),
            format!("{}", failed).red()
        )
    };
    println!("{}", summary);
    println!();

    if failed > 0 {
        if let Some(hint) = hint {
            println!("{}", style::format_warning(hint, no_color));
            println!();
        }
        print_troubleshooting_help(verbose, no_color);
    } else if warnings > 0 {
        println!("System is functional but some checks had warnings.");
        println!("Run with --verbose for more details.");
    } else {
        let msg = "All checks passed! Your system is ready to scan.";
        println!("{}", style::format_success(msg, no_color));
    }

    Ok(())
}

async fn check_scan(adapter: BtleAdapter) -> (Check, Option<&'static str>) {
    let mut session = ScanSession::new(Arc::new(adapter), Arc::new(CapabilitySet::all()));
    let (observer, mut rx) = QueueObserver::new();

    if let Err(e) = session.start_unfiltered(observer).await {
        return (Check::fail(format!("Failed ({})", e)), e.remediation());
    }

    let cancel = CancellationToken::new();
    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(TRIAL_SCAN).await;
        timer.cancel();
    });
    session.run_until_cancelled(&cancel).await;
    let seen = session.seen_count();
    session.stop().await;

    let mut failure = None;
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::ScanError { message } = event {
            failure = Some(message);
        }
    }

    let check = match (failure, seen) {
        (Some(message), _) => Check::fail(message),
        (None, 0) => Check::warn("No devices found nearby"),
        (None, n) => Check::pass(format!("Found {} device(s)", n)),
    };
    (check, None)
}

fn print_check_start(num: usize, name: &str, no_color: bool) {
    if no_color {
        print!("[{}/{}] {} ... ", num, TOTAL_CHECKS, name);
    } else {
        print!(
            "{} {} ... ",
            format!("[{}/{}]", num, TOTAL_CHECKS).dimmed(),
            name
        );
    }
    // Flush so the label shows before the check blocks
    let _ = stdout().flush();
}

fn print_check_result(check: &Check, no_color: bool) {
    let (icon, msg) = if check.passed && !check.warning {
        if no_color {
            ("[OK]".to_string(), check.message.clone())
        } else {
            (format!("{}", "[OK]".green()), check.message.clone())
        }
    } else if check.warning {
        if no_color {
            ("[!!]".to_string(), check.message.clone())
        } else {
            (
                format!("{}", "[!!]".yellow()),
                format!("{}", check.message.yellow()),
            )
        }
    } else if no_color {
        ("[FAIL]".to_string(), check.message.clone())
    } else {
        (
            format!("{}", "[FAIL]".red()),
            format!("{}", check.message.red()),
        )
    };
    println!("{} {}", icon, msg);
}

fn print_troubleshooting_help(verbose: bool, no_color: bool) {
    let title = if no_color {
        "Troubleshooting Tips:".to_string()
    } else {
        format!("{}", "Troubleshooting Tips:".yellow())
    };
    println!("{}", title);
    println!();

    #[cfg(target_os = "macos")]
    {
        println!("macOS:");
        println!("  • Turn Bluetooth on in System Settings");
        println!("  • Allow Bluetooth for your terminal under Privacy & Security");
        if verbose {
            println!("  • Restart the Bluetooth daemon: sudo pkill bluetoothd");
        }
    }

    #[cfg(target_os = "linux")]
    {
        println!("Linux:");
        println!("  • Install BlueZ: sudo apt install bluez");
        println!("  • Check the service: systemctl status bluetooth");
        println!("  • Unblock the radio: rfkill unblock bluetooth");
        if verbose {
            println!("  • Power the controller on: bluetoothctl power on");
            println!("  • Add user to bluetooth group: sudo usermod -aG bluetooth $USER");
        }
    }

    #[cfg(target_os = "windows")]
    {
        println!("Windows:");
        println!("  • Turn Bluetooth on in Settings → Bluetooth & devices");
        println!("  • Check Device Manager for the Bluetooth adapter");
        if verbose {
            println!("  • Update the Bluetooth driver");
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    let _ = verbose;

    println!();
}
