//! Command-line interface for waverun, built on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (run, status, template)
//! and the global flags (--config, --verbose).

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::classify::Category;

/// waverun: extrapolate a batch of waveforms, one run per data file.
#[derive(Debug, Parser)]
#[command(name = "waverun", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./waverun.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select extrapolations and run them, or record them in a new ledger.
    Run(RunArgs),

    /// Show every record in a ledger and totals per state.
    Status {
        /// Ledger database to read.
        #[arg(long)]
        database: PathBuf,

        /// Print the records as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the default launch-script template.
    Template,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Do not actually run extrapolations; just show what would be run.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Create this ledger from the selected runs and exit.
    #[arg(long, value_name = "DB", conflicts_with = "use_database")]
    pub generate_database: Option<PathBuf>,

    /// Track claims and results in this existing ledger.
    #[arg(long, value_name = "DB")]
    pub use_database: Option<PathBuf>,

    /// Select data that has not been started (the default).
    #[arg(long, default_value_t = false)]
    pub run_unstarted: bool,

    /// Select data newer than its last completed extrapolation.
    #[arg(long, default_value_t = false)]
    pub rerun_new_data: bool,

    /// Select extrapolations that started but did not finish.
    #[arg(long, default_value_t = false)]
    pub rerun_unfinished: bool,

    /// Select extrapolations that started but failed.
    #[arg(long, default_value_t = false)]
    pub rerun_errored: bool,

    /// Select every directory with sufficient data.
    #[arg(long, default_value_t = false)]
    pub rerun_all: bool,

    /// Start this far into the queue, wrapping around, to spread out
    /// concurrent runners.
    #[arg(long, default_value_t = 0)]
    pub start_with: usize,

    /// Launch-script template (see `waverun template` for the default).
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Directory holding the input data (overrides config).
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving extrapolated output (overrides config).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Selected categories; none selected means unstarted only.
    pub fn categories(&self) -> BTreeSet<Category> {
        let flags = [
            (self.run_unstarted, Category::Unstarted),
            (self.rerun_new_data, Category::NewerData),
            (self.rerun_unfinished, Category::Unfinished),
            (self.rerun_errored, Category::Errored),
            (self.rerun_all, Category::All),
        ];
        let mut selected: BTreeSet<Category> = flags
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, category)| category)
            .collect();
        if selected.is_empty() {
            selected.insert(Category::Unstarted);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn run_args(args: &[&str]) -> RunArgs {
        let argv = ["waverun", "run"].iter().chain(args.iter()).copied();
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn default_selection_is_unstarted() {
        let args = run_args(&[]);
        assert_eq!(args.categories(), BTreeSet::from([Category::Unstarted]));
        assert_eq!(args.start_with, 0);
        assert!(!args.dry_run);
    }

    #[test]
    fn flags_select_independent_categories() {
        let args = run_args(&["--rerun-errored", "--rerun-new-data"]);
        assert_eq!(
            args.categories(),
            BTreeSet::from([Category::NewerData, Category::Errored])
        );
    }

    #[test]
    fn run_parses_paths_and_offset() {
        let args = run_args(&[
            "--dry-run",
            "--use-database",
            "runs.db",
            "--start-with",
            "7",
            "--input-dir",
            "in",
            "--template-file",
            "t.py",
        ]);
        assert!(args.dry_run);
        assert_eq!(args.use_database, Some(PathBuf::from("runs.db")));
        assert_eq!(args.start_with, 7);
        assert_eq!(args.input_dir, Some(PathBuf::from("in")));
        assert_eq!(args.template_file, Some(PathBuf::from("t.py")));
        assert!(args.output_dir.is_none());
    }

    #[test]
    fn generate_and_use_database_conflict() {
        let result = Cli::try_parse_from([
            "waverun",
            "run",
            "--generate-database",
            "a.db",
            "--use-database",
            "b.db",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_offset_is_rejected() {
        assert!(Cli::try_parse_from(["waverun", "run", "--start-with", "-1"]).is_err());
    }

    #[test]
    fn status_parses_global_flags() {
        let cli = Cli::parse_from([
            "waverun",
            "--verbose",
            "status",
            "--database",
            "runs.db",
            "--json",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Status { database, json } => {
                assert_eq!(database, PathBuf::from("runs.db"));
                assert!(json);
            }
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
