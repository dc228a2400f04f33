//! Command implementations for the CLI.

mod config;
mod doctor;
mod scan;
mod services;

pub use config::cmd_config;
pub use doctor::cmd_doctor;
pub use scan::{ScanArgs, cmd_scan};
pub use services::cmd_services;
