//! Device configuration
//!
//! Defaults reproduce the stock device: node `xoroshiro128p` in class
//! `xoro`, seeded with digits of pi and phi.
//!
//! # Example
//!
//! ```rust
//! use xoroshiro_device::DeviceConfig;
//!
//! let config = DeviceConfig::from_json(r#"{"device_name": "xoro0"}"#).unwrap();
//! assert_eq!(config.device_name, "xoro0");
//! assert_eq!(config.class_name, "xoro");
//! assert_eq!(config.node_path(), "/dev/xoro0");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::{GeneratorState, SeedError, Xoroshiro128Plus};

pub const DEFAULT_DEVICE_NAME: &str = "xoroshiro128p";
pub const DEFAULT_CLASS_NAME: &str = "xoro";

/// Initial generator state: pi and phi.
pub const DEFAULT_SEED: GeneratorState = GeneratorState {
    s0: 314_159_265,
    s1: 1_618_033_989,
};

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Field '{0}' must not be empty")]
    EmptyName(&'static str),

    #[error("Field '{field}' contains '/': {value}")]
    InvalidName { field: &'static str, value: String },

    #[error("Invalid seed: {0}")]
    Seed(#[from] SeedError),
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name of the device node (appears as `/dev/<device_name>`)
    pub device_name: String,

    /// Name of the device class
    pub class_name: String,

    /// Initial generator state
    pub seed: GeneratorState,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
            seed: DEFAULT_SEED,
        }
    }
}

impl DeviceConfig {
    /// Parse and validate a JSON configuration; missing fields use defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DeviceConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name("device_name", &self.device_name)?;
        check_name("class_name", &self.class_name)?;
        self.generator()?;
        Ok(())
    }

    /// Generator seeded from this configuration
    pub fn generator(&self) -> Result<Xoroshiro128Plus, ConfigError> {
        Ok(Xoroshiro128Plus::from_state(self.seed)?)
    }

    /// Path of the device node
    pub fn node_path(&self) -> String {
        format!("/dev/{}", self.device_name)
    }
}

fn check_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyName(field));
    }
    if value.contains('/') {
        return Err(ConfigError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
