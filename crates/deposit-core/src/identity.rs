//! # Identity Newtypes
//!
//! Identifier newtypes for every object the deposit stack hands around.
//! UUID-based identifiers are valid by construction; [`PrincipalId`] is a
//! validated string because principals come from the authentication layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DepositError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a deposit document. Also the value of its `depid` PID.
    DepositId
);

uuid_identifier!(
    /// Identifier of a file bucket (working bucket or snapshot).
    BucketId
);

uuid_identifier!(
    /// Identifier of one object version inside a bucket.
    ObjectVersionId
);

uuid_identifier!(
    /// Identity of stored file content. Several object versions may link the
    /// same file (snapshots, renames) without copying bytes.
    FileId
);

/// An authenticated principal (user or service account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Maximum accepted length of a principal identifier.
    pub const MAX_LEN: usize = 255;

    /// Create a validated principal identifier.
    ///
    /// Rejects empty identifiers, identifiers with whitespace or `:` (the
    /// bearer-token separator), and identifiers longer than [`Self::MAX_LEN`].
    pub fn new(id: impl Into<String>) -> Result<Self, DepositError> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN {
            return Err(DepositError::InvalidDocument(format!(
                "principal id must be 1..={} characters",
                Self::MAX_LEN
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(DepositError::InvalidDocument(format!(
                "principal id {id:?} contains whitespace or ':'"
            )));
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
