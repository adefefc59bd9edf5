// Settings file handling for the comparison configuration

use crate::error::Result;
use dejavu_engine::{ComparisonConfig, Toggle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/dejavu/";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const DATABASE_FILE_NAME: &str = "dejavu.db";

/// Expand a leading `~` and environment variables in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

pub fn default_config_dir() -> PathBuf {
    expand_path(DEFAULT_CONFIG_DIR)
}

pub fn default_settings_path() -> PathBuf {
    default_config_dir().join(SETTINGS_FILE_NAME)
}

pub fn default_database_path() -> PathBuf {
    default_config_dir().join(DATABASE_FILE_NAME)
}

/// Load settings from `path`. A missing file yields the defaults, and keys
/// absent from the file keep their default values.
pub fn load_config(path: &Path) -> Result<ComparisonConfig> {
    if !path.exists() {
        debug!("No settings at {}, using defaults", path.display());
        return Ok(ComparisonConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str(&content)?;
    debug!("Loaded settings from {}", path.display());
    Ok(config)
}

pub fn save_config(path: &Path, config: &ComparisonConfig) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    info!("Saved settings to {}", path.display());
    Ok(())
}

/// Apply command line toggles on top of a loaded config. Disables win over
/// enables for the same toggle.
pub fn apply_overrides(
    mut config: ComparisonConfig,
    enable: &[Toggle],
    disable: &[Toggle],
) -> ComparisonConfig {
    for toggle in enable {
        config.set(*toggle, true);
    }
    for toggle in disable {
        config.set(*toggle, false);
    }
    config
}
