//! Terminal output: a spinner while an extrapolation runs and colored
//! summaries afterwards.
//!
//! Uses `indicatif` for the spinner and `console` for styling. Log lines go
//! through `tracing`; only the final tables are printed directly.

use std::collections::HashMap;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::coordinator::{ItemOutcome, RunSummary};
use crate::item::WorkItem;
use crate::ledger::{LedgerRecord, RecordState};

/// Spinner shown while one item's job is running.
pub struct ItemProgress {
    pb: ProgressBar,
}

impl ItemProgress {
    pub fn start(item: &WorkItem) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner().template("{spinner:.cyan} {elapsed} {msg}");
        if let Ok(style) = style {
            pb.set_style(style);
        }
        pb.set_message(format!("EXTRAPOLATING: {item}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    /// Clears the spinner. The outcome itself is logged by the caller.
    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

struct Palette {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl Palette {
    fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }
}

/// Prints one line per item followed by totals.
pub fn print_summary(summary: &RunSummary) {
    let p = Palette::new();
    println!();
    println!("{}", p.dim.apply_to("─── Run Summary ───"));
    for report in &summary.reports {
        let item = &report.item;
        let line = match &report.outcome {
            ItemOutcome::Finished { status: 0 } => format!("{} {item}", p.green.apply_to("✓")),
            ItemOutcome::Finished { status } => {
                format!("{} {item} (status {status})", p.red.apply_to("✗"))
            }
            ItemOutcome::WouldRun => format!("{} {item} (would run)", p.yellow.apply_to("·")),
            ItemOutcome::DryRunRecorded { status } => format!(
                "{} {item} (dry run, recorded status {status})",
                p.yellow.apply_to("·")
            ),
            ItemOutcome::Skipped => format!("{} {item} (already run)", p.dim.apply_to("↷")),
            ItemOutcome::NotAttempted { reason } => {
                format!("{} {item} (not attempted: {reason})", p.red.apply_to("!"))
            }
            ItemOutcome::Unrecorded { status, reason } => format!(
                "{} {item} (status {status}, not recorded: {reason})",
                p.red.apply_to("!")
            ),
        };
        println!("  {line}");
    }
    println!(
        "{} succeeded, {} failed, {} skipped, {} dry run",
        p.green.apply_to(summary.succeeded()),
        p.red.apply_to(summary.failed()),
        summary.skipped(),
        summary.dry_runs()
    );
}

/// Counts records per lifecycle state.
pub fn tally(records: &[LedgerRecord]) -> HashMap<RecordState, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.state()).or_insert(0) += 1;
    }
    counts
}

/// Prints every ledger record and the per-state totals.
pub fn print_status(records: &[LedgerRecord]) {
    let p = Palette::new();
    for record in records {
        let state = record.state();
        let style = match state {
            RecordState::Succeeded => &p.green,
            RecordState::Failed => &p.red,
            RecordState::InFlight => &p.yellow,
            RecordState::Unclaimed => &p.dim,
        };
        let detail = match state {
            RecordState::Unclaimed => String::new(),
            RecordState::InFlight => format!("started {}", record.started.as_deref().unwrap_or("")),
            RecordState::Succeeded | RecordState::Failed => format!(
                "finished {} error {}",
                record.finished.as_deref().unwrap_or(""),
                record.error
            ),
        };
        println!(
            "  {} {} {}",
            style.apply_to(format!("{:<10}", state.to_string())),
            record.item,
            p.dim.apply_to(detail)
        );
    }

    let counts = tally(records);
    let count = |state: RecordState| counts.get(&state).copied().unwrap_or(0);
    println!();
    println!(
        "{} unclaimed, {} in flight (running or crashed), {} succeeded, {} failed",
        count(RecordState::Unclaimed),
        p.yellow.apply_to(count(RecordState::InFlight)),
        p.green.apply_to(count(RecordState::Succeeded)),
        p.red.apply_to(count(RecordState::Failed))
    );
}
