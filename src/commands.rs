//! Subcommand bodies. Everything returned as an error here happens before
//! any item is processed; per-item failures end up in the run summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::classify::{Category, Classification, MarkerInspector};
use crate::cli::RunArgs;
use crate::config::WaverunConfig;
use crate::coordinator::{RunCoordinator, RunSummary};
use crate::discovery;
use crate::execute::ScriptExecutor;
use crate::ledger::Ledger;
use crate::queue;
use crate::template;
use crate::ui;

/// What `run` did.
#[derive(Debug)]
pub enum RunReport {
    /// `--generate-database`: the ledger was created and nothing ran.
    LedgerCreated { path: PathBuf, rows: usize },
    Ran(RunSummary),
}

/// Absolute form of `path` without a trailing separator.
fn absolute_root(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("cannot resolve {}", path.display()))?;
    Ok(absolute.components().collect())
}

pub fn run(args: &RunArgs, config: &WaverunConfig) -> Result<RunReport> {
    let input_dir = args.input_dir.as_deref().unwrap_or(config.input_dir.as_path());
    let output_dir = args.output_dir.as_deref().unwrap_or(config.output_dir.as_path());
    let input_root = absolute_root(input_dir)?;
    let output_root = absolute_root(output_dir)?;

    let template = match &args.template_file {
        Some(path) => template::load(path)?,
        None => template::DEFAULT_TEMPLATE.to_string(),
    };

    let candidates =
        discovery::find_candidates(&input_root, &config.data_files, &config.companion_file)?;

    let selected = args.categories();
    let classification = if selected.contains(&Category::All) {
        Classification::default()
    } else {
        Classification::compute(&MarkerInspector::new(&input_root, &output_root), &candidates)
    };
    let queue = queue::build_queue(&selected, &classification, &candidates, args.start_with);

    if let Some(path) = &args.generate_database {
        Ledger::create(path, &queue, config.busy_timeout())
            .with_context(|| format!("failed to generate ledger {}", path.display()))?;
        return Ok(RunReport::LedgerCreated {
            path: path.clone(),
            rows: queue.len(),
        });
    }

    let ledger = match &args.use_database {
        Some(path) => Some(
            Ledger::open(path, config.busy_timeout())
                .with_context(|| format!("failed to open ledger {}", path.display()))?,
        ),
        None => None,
    };

    let executor = ScriptExecutor::new(
        &input_root,
        &output_root,
        &template,
        config.interpreter.as_str(),
    );
    let mut coordinator = RunCoordinator::new(&executor, ledger);
    if args.dry_run {
        coordinator = coordinator.dry_run(config.dry_run_status);
    }

    let summary = coordinator.run(&queue);
    ui::print_summary(&summary);
    Ok(RunReport::Ran(summary))
}

pub fn status(database: &Path, json: bool, config: &WaverunConfig) -> Result<()> {
    let ledger = Ledger::open(database, config.busy_timeout())
        .with_context(|| format!("failed to open ledger {}", database.display()))?;
    let records = ledger.records()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        ui::print_status(&records);
    }
    Ok(())
}

pub fn template() {
    println!("{}", template::DEFAULT_TEMPLATE);
}
