//! # Document Envelope
//!
//! Deposits and records are stored as flat JSON objects. Four keys carry
//! control data; everything else is metadata:
//!
//! | Key        | Content                                              |
//! |------------|------------------------------------------------------|
//! | `$schema`  | schema URL                                           |
//! | `_deposit` | [`DepositControl`]                                   |
//! | `_bucket`  | working bucket (deposit) or snapshot bucket (record) |
//! | `_files`   | file refs (deposit) or serialized listing (record)   |
//!
//! [`Envelope`] is the typed split of such a document.

use serde_json::{Map, Value};

use deposit_core::{BucketId, DepositError};

use crate::status::DepositControl;

/// Schema URL key.
pub const SCHEMA_KEY: &str = "$schema";
/// Control block key.
pub const CONTROL_KEY: &str = "_deposit";
/// Bucket key.
pub const BUCKET_KEY: &str = "_bucket";
/// File list key.
pub const FILES_KEY: &str = "_files";

/// Keys that metadata accessors never write.
pub const CONTROL_KEYS: [&str; 4] = [SCHEMA_KEY, CONTROL_KEY, BUCKET_KEY, FILES_KEY];

/// Whether `key` is reserved for control data.
pub fn is_control_key(key: &str) -> bool {
    CONTROL_KEYS.contains(&key)
}

/// A stored document split into control data and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// `$schema` URL.
    pub schema: String,
    /// `_deposit` block.
    pub control: DepositControl,
    /// `_bucket`.
    pub bucket: Option<BucketId>,
    /// `_files`, left raw: its shape differs between deposits and records.
    pub files: Value,
    /// Every non-control key.
    pub metadata: Map<String, Value>,
}

impl Envelope {
    /// Split a stored document.
    pub fn parse(document: Value) -> Result<Self, DepositError> {
        let Value::Object(mut map) = document else {
            return Err(DepositError::InvalidDocument(
                "document is not a JSON object".to_string(),
            ));
        };
        let schema = match map.remove(SCHEMA_KEY) {
            Some(Value::String(s)) => s,
            _ => {
                return Err(DepositError::InvalidDocument(format!(
                    "missing {SCHEMA_KEY}"
                )))
            }
        };
        let control = map
            .remove(CONTROL_KEY)
            .ok_or_else(|| DepositError::InvalidDocument(format!("missing {CONTROL_KEY}")))?;
        let control: DepositControl = serde_json::from_value(control)?;
        let bucket = match map.remove(BUCKET_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        let files = map.remove(FILES_KEY).unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(Self {
            schema,
            control,
            bucket,
            files,
            metadata: map,
        })
    }

    /// Reassemble the flat document. Control keys that slipped into the
    /// metadata map are dropped.
    pub fn into_value(self) -> Result<Value, DepositError> {
        let mut map = Map::new();
        map.insert(SCHEMA_KEY.to_string(), Value::String(self.schema));
        map.insert(CONTROL_KEY.to_string(), serde_json::to_value(&self.control)?);
        map.insert(BUCKET_KEY.to_string(), serde_json::to_value(self.bucket)?);
        map.insert(FILES_KEY.to_string(), self.files);
        for (key, value) in self.metadata {
            if !is_control_key(&key) {
                map.insert(key, value);
            }
        }
        Ok(Value::Object(map))
    }
}
