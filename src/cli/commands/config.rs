//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<&str>) -> Result<()> {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            if shown.provider.api_key.is_some() {
                shown.provider.api_key = Some("********".to_string());
            }
            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }

        ConfigAction::Init { force } => {
            init_config(&path, *force)?;
        }
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        Output::warning(&format!("Config already exists at {}", path.display()));
        Output::info("Use --force to overwrite it.");
        return Ok(());
    }

    Settings::default().save_to(&path.to_path_buf())?;
    Output::success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}
