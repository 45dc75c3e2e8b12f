//! Engine settings.

use kpawnd_boot::{BootConfig, BootParams};
use serde::{Deserialize, Serialize};

use crate::error::{ShellError, ShellResult};

/// Settings fixed at engine construction. Missing JSON fields take defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hostname: String,
    pub version: String,
    pub kernel_version: String,
    /// User assumed before anyone logs in
    pub default_user: String,
    pub memory_mb: u32,
    pub boot: BootConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hostname: "kpawnd".to_string(),
            version: "0.6.7".to_string(),
            kernel_version: "6.1.0-kpawnd".to_string(),
            default_user: "user".to_string(),
            memory_mb: 32,
            boot: BootConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> ShellResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ShellError::usage(format!("config: {}", e)))
    }

    pub(crate) fn boot_params(&self, hostname: &str) -> BootParams {
        BootParams {
            version: self.version.clone(),
            kernel_version: self.kernel_version.clone(),
            hostname: hostname.to_string(),
            memory_mb: self.memory_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.hostname, "kpawnd");
        assert_eq!(config.boot.timeout_secs, 5);
    }

    #[test]
    fn test_partial_json() {
        let config =
            EngineConfig::from_json(r#"{"hostname":"box","boot":{"firmware_entry":true}}"#)
                .unwrap();
        assert_eq!(config.hostname, "box");
        assert_eq!(config.default_user, "user");
        assert!(config.boot.firmware_entry);
        assert_eq!(config.boot.timeout_secs, 5);
    }

    #[test]
    fn test_bad_json() {
        let err = EngineConfig::from_json("{").unwrap_err();
        assert!(err.to_string().starts_with("config: "));
    }
}
