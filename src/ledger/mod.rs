//! Durable claim/completion ledger shared by every runner process.
//!
//! The ledger is a single SQLite table keyed by `(subdirectory, datafile)`.
//! Every read-then-write runs inside an exclusive transaction, so two
//! processes racing on one item serialize and exactly one of them sees the
//! `started` column empty. A [`rusqlite::Transaction`] rolls back on drop,
//! which releases the lock on every early return.

mod record;

pub use record::{Claim, ClaimResult, LedgerRecord, RecordState};

use std::path::Path;
use std::time::Duration;

use chrono::Local;
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use tracing::debug;

use crate::error::RunnerError;
use crate::item::WorkItem;

const TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'extrapolations'";

const CREATE_TABLE: &str = "CREATE TABLE extrapolations (
    subdirectory TEXT NOT NULL,
    datafile TEXT NOT NULL,
    started TEXT NOT NULL DEFAULT '',
    finished TEXT NOT NULL DEFAULT '',
    error INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (subdirectory, datafile)
)";

/// Handle on one ledger store. Each process opens its own.
#[derive(Debug)]
pub struct Ledger {
    conn: Connection,
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn table_exists(conn: &Connection) -> Result<bool, RunnerError> {
    let count: i64 = conn.query_row(TABLE_EXISTS, [], |row| row.get(0))?;
    Ok(count > 0)
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerRecord> {
    Ok(LedgerRecord {
        item: WorkItem::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
        started: non_empty(row.get(2)?),
        finished: non_empty(row.get(3)?),
        error: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
    })
}

impl Ledger {
    /// Creates the store at `path` with one unclaimed row per item.
    ///
    /// All inserts share one exclusive transaction: either every row lands or
    /// none does. Fails with [`RunnerError::LedgerExists`] if the table is
    /// already there.
    pub fn create(
        path: &Path,
        items: &[WorkItem],
        busy_timeout: Duration,
    ) -> Result<Self, RunnerError> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;

        {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
            if table_exists(&tx)? {
                return Err(RunnerError::LedgerExists(path.to_path_buf()));
            }
            tx.execute_batch(CREATE_TABLE)?;
            {
                let mut insert = tx.prepare(
                    "INSERT INTO extrapolations (subdirectory, datafile, started, finished, error)
                     VALUES (?1, ?2, '', '', 0)",
                )?;
                for item in items {
                    insert.execute(params![item.subdirectory, item.data_file])?;
                }
            }
            tx.commit()?;
        }

        debug!(path = %path.display(), rows = items.len(), "created ledger");
        Ok(Self { conn })
    }

    /// Opens an existing store. Never creates one.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, RunnerError> {
        if !path.is_file() {
            return Err(RunnerError::LedgerMissing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(busy_timeout)?;
        if !table_exists(&conn)? {
            return Err(RunnerError::LedgerMissing(path.to_path_buf()));
        }
        Ok(Self { conn })
    }

    /// Atomically reserves `item` for this process.
    ///
    /// Reads the row and, if `started` is empty, stamps it and commits. An
    /// already-stamped row leaves the store untouched.
    pub fn try_claim(&mut self, item: &WorkItem) -> Result<ClaimResult, RunnerError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)?;

        let started: Option<Option<String>> = tx
            .query_row(
                "SELECT started FROM extrapolations WHERE subdirectory = ?1 AND datafile = ?2",
                params![item.subdirectory, item.data_file],
                |row| row.get(0),
            )
            .optional()?;

        let Some(started) = started else {
            return Err(RunnerError::NotInLedger(item.clone()));
        };
        if non_empty(started).is_some() {
            return Ok(ClaimResult::AlreadyClaimed);
        }

        let started = timestamp();
        tx.execute(
            "UPDATE extrapolations SET started = ?1 WHERE subdirectory = ?2 AND datafile = ?3",
            params![started, item.subdirectory, item.data_file],
        )?;
        tx.commit()?;

        Ok(ClaimResult::Claimed(Claim {
            item: item.clone(),
            started,
        }))
    }

    /// Records completion of a claimed item with its exit status.
    pub fn finalize(&mut self, claim: Claim, status: i32) -> Result<(), RunnerError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)?;
        let updated = tx.execute(
            "UPDATE extrapolations SET finished = ?1, error = ?2
             WHERE subdirectory = ?3 AND datafile = ?4 AND started != ''",
            params![timestamp(), status, claim.item.subdirectory, claim.item.data_file],
        )?;
        if updated == 0 {
            return Err(RunnerError::NotClaimed(claim.item));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn record(&self, item: &WorkItem) -> Result<Option<LedgerRecord>, RunnerError> {
        let record = self
            .conn
            .query_row(
                "SELECT subdirectory, datafile, started, finished, error FROM extrapolations
                 WHERE subdirectory = ?1 AND datafile = ?2",
                params![item.subdirectory, item.data_file],
                map_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Every row, in insertion order.
    pub fn records(&self) -> Result<Vec<LedgerRecord>, RunnerError> {
        let mut stmt = self.conn.prepare(
            "SELECT subdirectory, datafile, started, finished, error FROM extrapolations
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], map_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
