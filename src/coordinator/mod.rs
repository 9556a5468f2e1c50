//! Sequential run loop over a queue of work items.
//!
//! Each item goes through its own claim → execute → record cycle. Failures
//! stay with the item that produced them: they become a ledger status or a
//! logged outcome, and the loop moves on to the next item.

mod state;

pub use state::{Event, ItemRun, ItemState, StateMachine, Transition};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::RunnerError;
use crate::execute::{Execute, FAULT_STATUS};
use crate::item::WorkItem;
use crate::ledger::{ClaimResult, Ledger};
use crate::ui::ItemProgress;

/// How one item's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemOutcome {
    /// Ran and returned this status (recorded in the ledger when one is used).
    Finished { status: i32 },
    /// Dry run without a ledger: nothing claimed, nothing run.
    WouldRun,
    /// Dry run with a ledger: claimed and recorded with the sentinel status.
    DryRunRecorded { status: i32 },
    /// Another process already claimed the item.
    Skipped,
    /// The ledger failed before the item was claimed; it was not run.
    NotAttempted { reason: String },
    /// The item ran but its completion could not be written to the ledger.
    Unrecorded { status: i32, reason: String },
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            ItemOutcome::Finished { status } => *status != 0,
            ItemOutcome::NotAttempted { .. } | ItemOutcome::Unrecorded { .. } => true,
            _ => false,
        }
    }
}

/// What happened to one queued item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub item: WorkItem,
    pub transitions: Vec<ItemState>,
    pub outcome: ItemOutcome,
}

/// All item reports from one pass over the queue, in queue order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<ItemReport>,
}

impl RunSummary {
    pub fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Finished { status: 0 }))
    }

    pub fn failed(&self) -> usize {
        self.count(ItemOutcome::is_failure)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    pub fn dry_runs(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                ItemOutcome::WouldRun | ItemOutcome::DryRunRecorded { .. }
            )
        })
    }
}

/// Drives a run queue through the executor, optionally guarded by a ledger.
pub struct RunCoordinator<'a, E: Execute> {
    executor: &'a E,
    ledger: Option<Ledger>,
    dry_run: bool,
    dry_run_status: i32,
}

impl<'a, E: Execute> RunCoordinator<'a, E> {
    pub fn new(executor: &'a E, ledger: Option<Ledger>) -> Self {
        Self {
            executor,
            ledger,
            dry_run: false,
            dry_run_status: 17,
        }
    }

    /// Claims and records items without executing them. With a ledger the
    /// record carries `status` so it cannot be mistaken for a real run.
    pub fn dry_run(mut self, status: i32) -> Self {
        self.dry_run = true;
        self.dry_run_status = status;
        self
    }

    #[cfg(test)]
    fn into_ledger(self) -> Option<Ledger> {
        self.ledger
    }

    /// Processes `queue` in order, one item at a time.
    pub fn run(&mut self, queue: &[WorkItem]) -> RunSummary {
        info!(count = queue.len(), "running queued extrapolations");
        for item in queue {
            info!(item = %item, "queued");
        }

        let mut summary = RunSummary::default();
        for item in queue {
            summary.reports.push(self.run_item(item));
        }
        summary
    }

    fn run_item(&mut self, item: &WorkItem) -> ItemReport {
        let mut run = ItemRun::default();
        let outcome = match self.ledger.as_mut() {
            Some(ledger) => run_claimed(
                ledger,
                self.executor,
                self.dry_run,
                self.dry_run_status,
                item,
                &mut run,
            ),
            None => run_unclaimed(self.executor, self.dry_run, item, &mut run),
        };

        let outcome = outcome.unwrap_or_else(|e| {
            match &e {
                RunnerError::LedgerUnavailable(_) => {
                    error!(item = %item, error = %e, "ledger unavailable; item not attempted")
                }
                _ => error!(item = %item, error = %e, "could not claim item; not attempted"),
            }
            ItemOutcome::NotAttempted {
                reason: e.to_string(),
            }
        });

        ItemReport {
            item: item.clone(),
            transitions: run.transitions(),
            outcome,
        }
    }
}

fn step(run: &mut ItemRun, item: &WorkItem, event: Event) -> Result<(), RunnerError> {
    match run.advance(event) {
        Transition::Next(_) => Ok(()),
        Transition::Invalid { from, event } => Err(RunnerError::InvalidTransition {
            item: item.clone(),
            from,
            event,
        }),
    }
}

fn execute(executor: &impl Execute, item: &WorkItem) -> i32 {
    let progress = ItemProgress::start(item);
    let status = match executor.execute(item) {
        Ok(status) => status,
        Err(e) => {
            error!(item = %item, error = %e, "extrapolation could not be run");
            FAULT_STATUS
        }
    };
    progress.finish();

    if status == 0 {
        info!(item = %item, "finished");
    } else {
        warn!(item = %item, status, "finished with error");
    }
    status
}

fn run_unclaimed(
    executor: &impl Execute,
    dry_run: bool,
    item: &WorkItem,
    run: &mut ItemRun,
) -> Result<ItemOutcome, RunnerError> {
    if dry_run {
        step(run, item, Event::DryRun)?;
        info!(item = %item, "would run");
        return Ok(ItemOutcome::WouldRun);
    }

    info!(item = %item, "extrapolating");
    step(run, item, Event::Launch)?;
    let status = execute(executor, item);
    step(run, item, Event::Returned)?;
    Ok(ItemOutcome::Finished { status })
}

fn run_claimed(
    ledger: &mut Ledger,
    executor: &impl Execute,
    dry_run: bool,
    dry_run_status: i32,
    item: &WorkItem,
    run: &mut ItemRun,
) -> Result<ItemOutcome, RunnerError> {
    let claim = match ledger.try_claim(item)? {
        ClaimResult::AlreadyClaimed => {
            step(run, item, Event::ClaimRefused)?;
            info!(item = %item, "has already run");
            return Ok(ItemOutcome::Skipped);
        }
        ClaimResult::Claimed(claim) => {
            step(run, item, Event::ClaimGranted)?;
            info!(item = %item, started = claim.started(), "claimed; extrapolating");
            claim
        }
    };

    let status = if dry_run {
        step(run, item, Event::DryRun)?;
        info!(item = %item, status = dry_run_status, "dry run; recording sentinel status");
        dry_run_status
    } else {
        step(run, item, Event::Launch)?;
        let status = execute(executor, item);
        step(run, item, Event::Returned)?;
        status
    };

    // The item has run (or been marked) by now, so a ledger failure here must
    // not be reported as "not attempted".
    if let Err(e) = ledger.finalize(claim, status) {
        error!(item = %item, status, error = %e, "could not record completion in ledger");
        return Ok(ItemOutcome::Unrecorded {
            status,
            reason: e.to_string(),
        });
    }

    Ok(if dry_run {
        ItemOutcome::DryRunRecorded { status }
    } else {
        ItemOutcome::Finished { status }
    })
}
