//! # Schema Resolution
//!
//! Deposits and records point at JSON schemas through a `$schema` URL. A
//! deposit schema lives under the deposit prefix of the schema base URL
//! (`{base}deposits/x.json`); the matching record schema is the same path
//! without the prefix (`{base}x.json`).
//!
//! Only schema *identifiers* are resolved here. Validating document content
//! against a schema is not part of this stack.

use std::collections::BTreeSet;

use crate::config::DepositConfig;
use crate::error::DepositError;

/// Resolves and converts `$schema` URLs against the registered schema paths.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    base_url: String,
    deposit_prefix: String,
    default_deposit_schema: String,
    known: BTreeSet<String>,
}

impl SchemaResolver {
    /// Build a resolver from configuration.
    pub fn from_config(config: &DepositConfig) -> Self {
        let mut base_url = config.schemas_base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let mut deposit_prefix = config.deposit_schema_prefix.trim_matches('/').to_string();
        deposit_prefix.push('/');
        Self {
            base_url,
            deposit_prefix,
            default_deposit_schema: config.default_deposit_schema.clone(),
            known: config.schemas.iter().cloned().collect(),
        }
    }

    /// Absolute URL of a schema path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL of the default deposit schema, assigned when `$schema` is absent.
    pub fn default_deposit_schema(&self) -> String {
        self.url(&self.default_deposit_schema)
    }

    /// Whether a schema path is registered.
    pub fn is_known(&self, path: &str) -> bool {
        self.known.contains(path)
    }

    /// Check that `url` names a registered deposit schema.
    pub fn validate_deposit_schema(&self, url: &str) -> Result<(), DepositError> {
        let path = self.deposit_path(url)?;
        if self.is_known(&format!("{}{}", self.deposit_prefix, path)) {
            Ok(())
        } else {
            Err(DepositError::SchemaNotFound(url.to_string()))
        }
    }

    /// Convert a deposit schema URL into the record schema URL.
    pub fn record_schema(&self, deposit_schema: &str) -> Result<String, DepositError> {
        let path = self.deposit_path(deposit_schema)?;
        if !self.is_known(path) {
            return Err(DepositError::SchemaNotFound(self.url(path)));
        }
        Ok(self.url(path))
    }

    /// Convert a record schema URL into the deposit schema URL.
    pub fn deposit_schema(&self, record_schema: &str) -> Result<String, DepositError> {
        let path = record_schema
            .strip_prefix(&self.base_url)
            .ok_or_else(|| DepositError::SchemaNotFound(record_schema.to_string()))?;
        let deposit_path = format!("{}{}", self.deposit_prefix, path);
        if !self.is_known(&deposit_path) {
            return Err(DepositError::SchemaNotFound(self.url(&deposit_path)));
        }
        Ok(self.url(&deposit_path))
    }

    /// Path of a deposit schema URL relative to `{base}{prefix}`.
    fn deposit_path<'a>(&self, url: &'a str) -> Result<&'a str, DepositError> {
        url.strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix(&self.deposit_prefix))
            .ok_or_else(|| DepositError::SchemaNotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SchemaResolver {
        let mut config = DepositConfig::default();
        config.schemas.push("test-v1.0.0.json".into());
        config.schemas.push("deposits/test-v1.0.0.json".into());
        SchemaResolver::from_config(&config)
    }

    #[test]
    fn default_schema_is_under_deposit_prefix() {
        assert_eq!(
            resolver().default_deposit_schema(),
            "http://localhost/schemas/deposits/deposit-v1.0.0.json"
        );
    }

    #[test]
    fn deposit_to_record_schema() {
        let r = resolver();
        let record = r
            .record_schema("http://localhost/schemas/deposits/deposit-v1.0.0.json")
            .unwrap();
        assert_eq!(record, "http://localhost/schemas/deposit-v1.0.0.json");
    }

    #[test]
    fn record_to_deposit_schema() {
        let r = resolver();
        let deposit = r
            .deposit_schema("http://localhost/schemas/test-v1.0.0.json")
            .unwrap();
        assert_eq!(deposit, "http://localhost/schemas/deposits/test-v1.0.0.json");
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let r = resolver();
        let err = r
            .validate_deposit_schema("http://localhost/schemas/deposits/invalid.json")
            .unwrap_err();
        assert!(matches!(err, DepositError::SchemaNotFound(_)));
        assert!(r
            .validate_deposit_schema("http://localhost/schemas/deposit-v1.0.0.json")
            .is_err());
        assert!(r
            .validate_deposit_schema("https://elsewhere/schemas/deposits/deposit-v1.0.0.json")
            .is_err());
    }
}
