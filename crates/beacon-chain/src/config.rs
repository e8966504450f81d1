//! Relay configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Parameters of the threshold relay the local chain enforces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Number of members in a group
    pub group_size: u16,

    /// Minimum number of supporting signatures for a DKG result
    pub honest_threshold: u16,

    /// Blocks between consecutive members' eligibility to publish a result
    pub result_publication_block_step: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            group_size: 5,
            honest_threshold: 3,
            result_publication_block_step: 3,
        }
    }
}

impl RelayConfig {
    /// Create a configuration with the default publication step
    pub fn new(group_size: u16, honest_threshold: u16) -> Self {
        Self {
            group_size,
            honest_threshold,
            ..Self::default()
        }
    }

    /// Blocks after which a pending relay entry times out
    pub fn relay_entry_timeout(&self) -> u64 {
        self.result_publication_block_step * u64::from(self.group_size)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(ChainError::Config("group_size must be >= 1".to_string()));
        }
        if self.honest_threshold == 0 {
            return Err(ChainError::Config(
                "honest_threshold must be >= 1".to_string(),
            ));
        }
        if self.honest_threshold > self.group_size {
            return Err(ChainError::Config(format!(
                "honest_threshold {} exceeds group_size {}",
                self.honest_threshold, self.group_size
            )));
        }
        if self.result_publication_block_step == 0 {
            return Err(ChainError::Config(
                "result_publication_block_step must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
