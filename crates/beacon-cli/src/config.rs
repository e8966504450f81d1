//! Locating and loading the relay configuration

use std::path::{Path, PathBuf};

use beacon_chain::RelayConfig;
use tracing::debug;

/// Environment variable overriding the configuration path
pub const CONFIG_ENV: &str = "BEACON_CONFIG";

/// Configuration file used when neither a flag nor the environment names one
pub const DEFAULT_CONFIG_FILE: &str = "beacon.json";

/// Configuration path: explicit flag, then `BEACON_CONFIG`, then the default
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the configuration at `path`, falling back to defaults if absent
pub fn load_or_default(path: &Path) -> beacon_chain::Result<RelayConfig> {
    if path.exists() {
        RelayConfig::load(path)
    } else {
        debug!("No config at {:?}, using defaults", path);
        Ok(RelayConfig::default())
    }
}
