//! Visual styling utilities for the CLI.
//!
//! This module provides consistent styling across all CLI output including:
//! - Spinners for long-running operations
//! - Signal strength bars
//! - Status prefixes and error boxes

use std::time::Duration;

use blescan_types::ServiceId;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

// ============================================================================
// Progress Indicators
// ============================================================================

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

/// Get the standard spinner style.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .expect("valid template")
        .tick_chars(SPINNER_TICK_CHARS)
}

/// Create a spinner for scanning operations.
pub fn scanning_spinner(timeout_secs: u64, service: Option<&ServiceId>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(scanning_message(timeout_secs, service));
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Spinner text for a scan of `timeout_secs`.
pub fn scanning_message(timeout_secs: u64, service: Option<&ServiceId>) -> String {
    match service {
        Some(service) => format!("Scanning for {} devices... ({}s)", service, timeout_secs),
        None => format!("Scanning for devices... ({}s)", timeout_secs),
    }
}

/// Print a message to stdout while suspending a spinner.
pub fn print_suspended_stdout(spinner: Option<&ProgressBar>, message: &str) {
    if let Some(pb) = spinner {
        pb.suspend(|| {
            println!("{}", message);
        });
    } else {
        println!("{}", message);
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Render RSSI as a ten-step bar followed by the dBm value.
pub fn format_signal_bar(rssi: i16, no_color: bool) -> String {
    // -30 dBm = excellent (10), -100 dBm = very weak (0)
    let strength = (rssi.saturating_add(100).clamp(0, 70) as f32 / 7.0).round() as usize;
    let filled = strength.min(10);
    let empty = 10 - filled;

    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(empty));

    if no_color {
        format!("{} {:>4}", bar, rssi)
    } else if filled >= 7 {
        format!("{} {:>4}", bar.green(), rssi)
    } else if filled >= 4 {
        format!("{} {:>4}", bar.yellow(), rssi)
    } else {
        format!("{} {:>4}", bar.red(), rssi)
    }
}

/// Boxed error with numbered suggestions.
pub fn format_error_box(title: &str, message: &str, suggestions: &[&str]) -> String {
    let width: usize = 60;
    let border_top = format!(
        "┌─ {} {}",
        title,
        "─".repeat(width.saturating_sub(title.chars().count() + 4))
    );
    let border_bottom = format!("└{}┘", "─".repeat(width - 2));

    let mut lines = vec![border_top, "│".to_string()];

    for line in message.lines() {
        lines.push(format!("│  {}", line));
    }

    if !suggestions.is_empty() {
        lines.push("│".to_string());
        lines.push("│  Troubleshooting:".to_string());
        for (i, suggestion) in suggestions.iter().enumerate() {
            lines.push(format!("│    {}. {}", i + 1, suggestion));
        }
    }

    lines.push("│".to_string());
    lines.push(border_bottom);

    lines.join("\n")
}

pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

pub fn format_warning(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[!!] {}", message)
    } else {
        format!("{} {}", "[!!]".yellow(), message)
    }
}

pub fn format_error(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[FAIL] {}", message)
    } else {
        format!("{} {}", "[FAIL]".red(), message)
    }
}

pub fn format_title(title: &str, no_color: bool) -> String {
    if no_color {
        format!("{}\n{}", title, "━".repeat(title.chars().count()))
    } else {
        format!(
            "{}\n{}",
            title.bold(),
            "━".repeat(title.chars().count()).dimmed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_bar_bounds() {
        assert_eq!(format_signal_bar(-30, true), "██████████  -30");
        assert_eq!(format_signal_bar(-120, true), "░░░░░░░░░░ -120");
        assert_eq!(format_signal_bar(-65, true), "█████░░░░░  -65");
    }

    #[test]
    fn test_scanning_message() {
        assert_eq!(scanning_message(10, None), "Scanning for devices... (10s)");
        let hr = ServiceId::from_short(0x180D);
        assert_eq!(
            scanning_message(5, Some(&hr)),
            "Scanning for 0x180D devices... (5s)"
        );
    }

    #[test]
    fn test_plain_prefixes() {
        assert_eq!(format_success("ready", true), "[OK] ready");
        assert_eq!(format_warning("hmm", true), "[!!] hmm");
        assert_eq!(format_error("nope", true), "[FAIL] nope");
    }

    #[test]
    fn test_error_box_lists_suggestions() {
        let text = format_error_box("Scan failed", "Bluetooth is turned off", &["Turn it on"]);
        assert!(text.contains("│  Bluetooth is turned off"));
        assert!(text.contains("│    1. Turn it on"));
    }
}
