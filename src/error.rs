use std::path::PathBuf;

use thiserror::Error;

use crate::coordinator::{Event, ItemState};
use crate::item::WorkItem;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Could not read template file '{path}': {source}")]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input directory does not exist: {0}")]
    InputRootMissing(PathBuf),

    #[error("Ledger already exists in {0}")]
    LedgerExists(PathBuf),

    #[error("No ledger table found in {0}. Create one with `--generate-database` first.")]
    LedgerMissing(PathBuf),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("{0} has no ledger record")]
    NotInLedger(WorkItem),

    #[error("{0} was never claimed in the ledger")]
    NotClaimed(WorkItem),

    #[error("{item}: cannot apply {event:?} in state {from}")]
    InvalidTransition {
        item: WorkItem,
        from: ItemState,
        event: Event,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// True for failures that must abort the process before any item runs.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            RunnerError::TemplateNotFound { .. }
                | RunnerError::InputRootMissing(_)
                | RunnerError::LedgerExists(_)
                | RunnerError::LedgerMissing(_)
        )
    }
}

impl From<rusqlite::Error> for RunnerError {
    // Lock contention past the busy timeout and unopenable files are reported
    // as unavailability so callers never mistake them for a free item.
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
                RunnerError::LedgerUnavailable(err.to_string())
            }
            _ => RunnerError::Sqlite(err),
        }
    }
}
