//! # Deposit Configuration
//!
//! Settings of the lifecycle layer, passed explicitly to every operation via
//! the deposit context. Loaded from YAML when a file is supplied; every field
//! has a default so an empty document is a valid configuration.
//!
//! ```yaml
//! schemas_base_url: "http://localhost/schemas/"
//! deposit_schema_prefix: "deposits"
//! default_deposit_schema: "deposits/deposit-v1.0.0.json"
//! schemas:
//!   - "deposits/deposit-v1.0.0.json"
//!   - "deposit-v1.0.0.json"
//! deposit_pid_type: "depid"
//! record_pid_type: "recid"
//! default_storage_class: "S"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`DepositConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Configuration of the deposit lifecycle layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositConfig {
    /// Base URL under which all schemas are published.
    pub schemas_base_url: String,
    /// Path prefix separating deposit schemas from record schemas.
    pub deposit_schema_prefix: String,
    /// Schema path assigned to deposits created without `$schema`.
    pub default_deposit_schema: String,
    /// Registered schema paths, relative to the base URL.
    pub schemas: Vec<String>,
    /// PID type minted for deposits.
    pub deposit_pid_type: String,
    /// PID type minted for published records.
    pub record_pid_type: String,
    /// Storage class of newly created deposit buckets.
    pub default_storage_class: String,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            schemas_base_url: "http://localhost/schemas/".to_string(),
            deposit_schema_prefix: "deposits".to_string(),
            default_deposit_schema: "deposits/deposit-v1.0.0.json".to_string(),
            schemas: vec![
                "deposits/deposit-v1.0.0.json".to_string(),
                "deposit-v1.0.0.json".to_string(),
            ],
            deposit_pid_type: "depid".to_string(),
            record_pid_type: "recid".to_string(),
            default_storage_class: "S".to_string(),
        }
    }
}

impl DepositConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = DepositConfig::from_yaml_str("record_pid_type: pubid\n").unwrap();
        assert_eq!(config.record_pid_type, "pubid");
        assert_eq!(config.deposit_pid_type, "depid");
        assert_eq!(config.schemas.len(), 2);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(DepositConfig::from_yaml_str("schemas: 12: x").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DepositConfig::from_file("/nonexistent/deposit.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/deposit.yaml"));
    }
}
