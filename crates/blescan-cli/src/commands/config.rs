//! Config command implementation.

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::style;

pub fn cmd_config(action: ConfigAction, quiet: bool, no_color: bool) -> Result<()> {
    let path = Config::path();

    match action {
        ConfigAction::Show => {
            if !path.exists() && !quiet {
                println!("# No config file at {} (showing defaults)", path.display());
            }
            let content =
                toml::to_string_pretty(&Config::load()).context("Failed to serialize config")?;
            print!("{}", content);
        }
        ConfigAction::Get { key } => match Config::load().get(key) {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        ConfigAction::Set { key, value } => {
            let mut config = Config::load();
            config.set(key, &value)?;
            config.save()?;
            if !quiet {
                let shown = config.get(key).unwrap_or(value);
                let msg = format!("Set {} = {}", key.as_str(), shown);
                println!("{}", style::format_success(&msg, no_color));
            }
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load();
            config.unset(key);
            config.save()?;
            if !quiet {
                let msg = format!("Unset {}", key.as_str());
                println!("{}", style::format_success(&msg, no_color));
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init => {
            if path.exists() {
                let msg = format!("Config already exists at {}", path.display());
                println!("{}", style::format_warning(&msg, no_color));
            } else {
                Config::default().save()?;
                if !quiet {
                    let msg = format!("Created {}", path.display());
                    println!("{}", style::format_success(&msg, no_color));
                }
            }
        }
    }

    Ok(())
}
