//! Deposit status and the `_deposit` control block.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use deposit_core::{DepositId, PrincipalId, PublishedPid};

/// Lifecycle status of a deposit.
///
/// ```text
/// create ──▶ Draft ──publish──▶ Published
///              ▲                   │
///              └──────edit─────────┘
/// ```
///
/// `discard` keeps a draft a draft; `delete` is only open to drafts that
/// were never published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    /// Editable working copy.
    Draft,
    /// Frozen; mirrors the published record.
    Published,
}

impl DepositStatus {
    /// The serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `_deposit` block persisted with every deposit and copied into its
/// published record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositControl {
    /// Deposit identifier, also the value of the deposit PID.
    pub id: DepositId,
    /// Current status.
    pub status: DepositStatus,
    /// Principals allowed to mutate the deposit.
    #[serde(default)]
    pub owners: BTreeSet<PrincipalId>,
    /// Pointer at the published record, set on first publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<PublishedPid>,
}

impl DepositControl {
    /// Control block of a freshly created draft.
    pub fn draft(id: DepositId, owners: BTreeSet<PrincipalId>) -> Self {
        Self {
            id,
            status: DepositStatus::Draft,
            owners,
            pid: None,
        }
    }
}
