//! Command-line BLE device scanner.
//!
//! The `blescan` binary runs a scan session on the first Bluetooth adapter and
//! lists every device it hears, once per device.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Scan for nearby devices, optionally filtered by service |
//! | `doctor` | Walk the adapter, power, scanner and scan checks |
//! | `services` | List service names accepted by `--service` |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Output Formats
//!
//! - **Text** (default): one line per device with a signal bar
//! - **JSON**: `{ "count", "service", "devices": [...] }`
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/blescan/config.toml` (or the
//! platform equivalent, or the path in `BLESCAN_CONFIG`). Options:
//!
//! - `service`: Default service filter
//! - `timeout`: Default scan duration in seconds
//! - `format`: Default output format
//! - `no_color`: Disable colored output
//!
//! # Environment Variables
//!
//! - `BLESCAN_SERVICE`: Service filter (overridden by `--service`)
//! - `BLESCAN_CONFIG`: Config file location
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! Scan for ten seconds:
//! ```bash
//! blescan scan
//! ```
//!
//! Heart-rate monitors only, as JSON:
//! ```bash
//! blescan scan --service heart-rate --format json --output hr.json
//! ```

// This crate is primarily a binary CLI application.
// The command implementations live in main.rs and its modules.

// Re-export core dependencies for convenience
pub use blescan_core;
pub use blescan_types;
