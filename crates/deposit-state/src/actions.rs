//! # Action Dispatcher
//!
//! Maps an action name to the lifecycle operation it runs, addressing the
//! deposit by its PID value.

use std::str::FromStr;

use deposit_core::{DepositError, DepositId};

use crate::context::DepositContext;
use crate::deposit::Deposit;

/// Lifecycle operations reachable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositAction {
    Publish,
    Edit,
    Discard,
    Delete,
}

impl DepositAction {
    pub const ALL: [DepositAction; 4] = [Self::Publish, Self::Edit, Self::Discard, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Edit => "edit",
            Self::Discard => "discard",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for DepositAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepositAction {
    type Err = DepositError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| DepositError::NotFound(format!("action {s}")))
    }
}

/// What a dispatched action left behind.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The deposit after the operation.
    Updated(Deposit),
    /// The deposit no longer exists.
    Deleted(DepositId),
}

/// Run `action` against the deposit registered under `pid_value`.
pub fn dispatch(
    ctx: &DepositContext,
    pid_value: &str,
    action: DepositAction,
) -> Result<ActionOutcome, DepositError> {
    let deposit = Deposit::resolve(ctx, pid_value)?;
    execute(ctx, deposit, action)
}

/// Run `action` against an already loaded deposit.
pub fn execute(
    ctx: &DepositContext,
    mut deposit: Deposit,
    action: DepositAction,
) -> Result<ActionOutcome, DepositError> {
    tracing::debug!(deposit_id = %deposit.id(), action = action.as_str(), "dispatching action");
    match action {
        DepositAction::Publish => deposit.publish(ctx)?,
        DepositAction::Edit => deposit.edit(ctx)?,
        DepositAction::Discard => deposit.discard(ctx)?,
        DepositAction::Delete => {
            let id = deposit.id();
            deposit.delete(ctx)?;
            return Ok(ActionOutcome::Deleted(id));
        }
    }
    Ok(ActionOutcome::Updated(deposit))
}
