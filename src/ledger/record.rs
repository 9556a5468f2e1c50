use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;

/// One ledger row.
///
/// `started` without `finished` means the item is either still running or its
/// process died mid-run. The ledger has no way to tell which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub item: WorkItem,
    pub started: Option<String>,
    pub finished: Option<String>,
    pub error: i64,
}

/// Lifecycle position derived from a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordState {
    Unclaimed,
    InFlight,
    Succeeded,
    Failed,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Unclaimed => write!(f, "unclaimed"),
            RecordState::InFlight => write!(f, "in flight"),
            RecordState::Succeeded => write!(f, "succeeded"),
            RecordState::Failed => write!(f, "failed"),
        }
    }
}

impl LedgerRecord {
    pub fn state(&self) -> RecordState {
        match (&self.started, &self.finished) {
            (None, _) => RecordState::Unclaimed,
            (Some(_), None) => RecordState::InFlight,
            (Some(_), Some(_)) if self.error == 0 => RecordState::Succeeded,
            (Some(_), Some(_)) => RecordState::Failed,
        }
    }
}

/// Proof that this process won the claim on an item.
///
/// Only [`Ledger::try_claim`](super::Ledger::try_claim) hands these out and
/// [`Ledger::finalize`](super::Ledger::finalize) consumes one, so an item can
/// only be finalized by the process that claimed it.
#[derive(Debug, PartialEq, Eq)]
pub struct Claim {
    pub(super) item: WorkItem,
    pub(super) started: String,
}

impl Claim {
    pub fn item(&self) -> &WorkItem {
        &self.item
    }

    /// Timestamp written to the `started` column.
    pub fn started(&self) -> &str {
        &self.started
    }
}

/// Outcome of a claim attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum ClaimResult {
    Claimed(Claim),
    AlreadyClaimed,
}
