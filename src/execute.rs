//! Launching one extrapolation.
//!
//! [`Execute`] is the seam the coordinator calls through; [`ScriptExecutor`]
//! is the real implementation that writes the launch script into the item's
//! output directory and runs it to completion.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::classify::marker_path;
use crate::error::RunnerError;
use crate::item::WorkItem;
use crate::template;

/// Status recorded when the job could not be launched or died from a signal.
pub const FAULT_STATUS: i32 = -1;

/// Runs one item to completion and reports its exit status.
///
/// Blocks for as long as the job runs. Called at most once per claim.
pub trait Execute {
    fn execute(&self, item: &WorkItem) -> Result<i32, RunnerError>;
}

/// Writes `Extrapolate_<stem>.py` from a template and runs it with an
/// interpreter, maintaining the output markers around the run.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    output_root: PathBuf,
    template: String,
    interpreter: String,
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl ScriptExecutor {
    /// Fills the run-wide template keys now; per-item keys are filled at launch.
    pub fn new(
        input_root: &Path,
        output_root: &Path,
        template: &str,
        interpreter: impl Into<String>,
    ) -> Self {
        let input = input_root.to_string_lossy();
        let output = output_root.to_string_lossy();
        let template = template::render(
            template,
            &[
                ("ScriptName", env!("CARGO_PKG_NAME")),
                ("TopLevelInputDir", &*input),
                ("TopLevelOutputDir", &*output),
            ],
        );
        Self {
            output_root: output_root.to_path_buf(),
            template,
            interpreter: interpreter.into(),
        }
    }

    /// The launch script for `item`.
    pub fn script_for(&self, item: &WorkItem) -> String {
        template::render(
            &self.template,
            &[
                ("Subdirectory", item.subdirectory.as_str()),
                ("DataFile", item.data_file.as_str()),
            ],
        )
    }
}

impl Execute for ScriptExecutor {
    fn execute(&self, item: &WorkItem) -> Result<i32, RunnerError> {
        let out_dir = item.output_dir(&self.output_root);
        fs::create_dir_all(&out_dir)?;

        remove_if_present(&marker_path(&self.output_root, item, "finished"))?;
        remove_if_present(&marker_path(&self.output_root, item, "error"))?;
        File::create(marker_path(&self.output_root, item, "started"))?;

        let script = out_dir.join(format!("Extrapolate_{}.py", item.stem()));
        fs::write(&script, self.script_for(item))?;
        let log = File::create(out_dir.join(format!("Extrapolate_{}.out", item.stem())))?;
        let stdout = log.try_clone()?;

        debug!(script = %script.display(), interpreter = %self.interpreter, "launching");
        let code = match Command::new(&self.interpreter)
            .arg(&script)
            .current_dir(&out_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(log)
            .status()
        {
            Ok(status) => status.code().unwrap_or(FAULT_STATUS),
            Err(e) => {
                warn!(%item, interpreter = %self.interpreter, error = %e, "failed to launch");
                FAULT_STATUS
            }
        };

        // The job has run; its status stands even if the marker cannot be written.
        let marker = if code == 0 { "finished" } else { "error" };
        if let Err(e) = File::create(marker_path(&self.output_root, item, marker)) {
            warn!(%item, marker, error = %e, "failed to write output marker");
        }
        Ok(code)
    }
}
