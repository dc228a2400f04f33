//! Configuration file management.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use blescan_types::ServiceId;
use serde::{Deserialize, Serialize};

use crate::cli::{ConfigKey, OutputFormat};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "BLESCAN_CONFIG";

/// Scan duration used when neither the command line nor the config sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default service filter
    #[serde(default)]
    pub service: Option<String>,

    /// Default scan duration in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Default output format
    #[serde(default)]
    pub format: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blescan")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let path = Self::path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Current value of `key` as it would be shown to the user.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::Service => self.service.clone(),
            ConfigKey::Timeout => self.timeout.map(|t| t.to_string()),
            ConfigKey::Format => self.format.clone(),
            ConfigKey::NoColor => Some(self.no_color.to_string()),
        }
    }

    /// Validate and store `value` under `key`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Service => {
                let service: ServiceId = value
                    .parse()
                    .with_context(|| format!("Invalid service '{}'", value))?;
                // Stored in canonical form: known name, else short or full UUID.
                self.service = Some(
                    service
                        .known_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| service.to_string()),
                );
            }
            ConfigKey::Timeout => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("'{}' is not a valid number", value))?;
                if secs == 0 {
                    bail!("Timeout must be at least 1 second");
                }
                self.timeout = Some(secs);
            }
            ConfigKey::Format => {
                let format = parse_format(value)?;
                self.format = Some(format.as_str().to_string());
            }
            ConfigKey::NoColor => {
                self.no_color = parse_bool_arg(value).map_err(anyhow::Error::msg)?;
            }
        }
        Ok(())
    }

    /// Reset `key` to its default.
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Service => self.service = None,
            ConfigKey::Timeout => self.timeout = None,
            ConfigKey::Format => self.format = None,
            ConfigKey::NoColor => self.no_color = false,
        }
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value.to_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => bail!("Invalid format '{}'. Valid values: text, json", value),
    }
}

/// Parse boolean argument with flexible input
pub fn parse_bool_arg(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "enable" | "enabled" => Ok(true),
        "false" | "no" | "off" | "0" | "disable" | "disabled" => Ok(false),
        _ => Err(format!(
            "Invalid boolean value '{}'. Use: true/false, yes/no, on/off, 1/0",
            s
        )),
    }
}

/// Resolve scan duration: explicit argument, then config, then default.
pub fn resolve_timeout(cmd_timeout: Option<u64>, config: &Config, default: u64) -> u64 {
    cmd_timeout.or(config.timeout).unwrap_or(default)
}

/// Resolve the service filter: explicit argument, then config unless
/// `all` asks for an unfiltered scan.
pub fn resolve_service(
    cmd_service: Option<String>,
    all: bool,
    config: &Config,
) -> Result<Option<ServiceId>> {
    let raw = if all {
        None
    } else {
        cmd_service.or_else(|| config.service.clone())
    };
    raw.map(|s| {
        s.parse::<ServiceId>()
            .with_context(|| format!("Invalid service '{}'", s))
    })
    .transpose()
}

/// Resolve output format: explicit argument, then config, then text.
pub fn resolve_format(cmd_format: Option<OutputFormat>, config: &Config) -> OutputFormat {
    if let Some(format) = cmd_format {
        return format;
    }
    match config.format.as_deref().map(parse_format) {
        Some(Ok(format)) => format,
        Some(Err(e)) => {
            eprintln!("Warning: {} (using text)", e);
            OutputFormat::Text
        }
        None => OutputFormat::Text,
    }
}
