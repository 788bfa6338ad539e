mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Returns the config directory: <platform config dir>/depth-parallax/
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("depth-parallax");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the config file path: <config dir>/depth-parallax/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from disk, or return default if not found.
///
/// The loaded config is validated before it is returned.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path()?;
    if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        let config = parse_config(&contents).with_context(|| format!("{}", path.display()))?;
        info!(?path, "Loaded config");
        Ok(config)
    } else {
        info!("No config found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Parse and validate a TOML config document.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Save config to disk.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let path = config_path()?;
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    info!(?path, "Saved config");
    Ok(())
}
