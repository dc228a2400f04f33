//! Services command implementation.

use std::path::PathBuf;

use anyhow::Result;
use blescan_types::{ServiceId, uuids};
use owo_colors::OwoColorize;

use crate::cli::OutputFormat;
use crate::util::write_output;

/// List the service names `--service` understands.
pub fn cmd_services(format: OutputFormat, output: Option<&PathBuf>, no_color: bool) -> Result<()> {
    let content = match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = uuids::KNOWN_SERVICES
                .iter()
                .map(|(name, uuid)| {
                    serde_json::json!({
                        "name": name,
                        "short": ServiceId::new(*uuid).to_string(),
                        "uuid": uuid.to_string(),
                    })
                })
                .collect();
            let mut json = serde_json::to_string_pretty(&entries)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (name, uuid) in uuids::KNOWN_SERVICES {
                let short = ServiceId::new(*uuid).to_string();
                let name = if no_color || output.is_some() {
                    format!("{:<24}", name)
                } else {
                    format!("{:<24}", name).bold().to_string()
                };
                out.push_str(&format!("{} {:<12} {}\n", name, short, uuid));
            }
            out
        }
    };
    write_output(output, &content)
}
