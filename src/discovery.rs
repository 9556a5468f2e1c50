//! Scans the input root for directories holding extrapolation input.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::RunnerError;
use crate::item::WorkItem;

/// Finds candidate work items under `input_root`.
///
/// A directory qualifies when it contains `companion_file`; it then yields one
/// item per entry of `data_files` present beside it. Subdirectories are
/// reported relative to `input_root` and the result is sorted by path.
pub fn find_candidates(
    input_root: &Path,
    data_files: &[String],
    companion_file: &str,
) -> Result<Vec<WorkItem>, RunnerError> {
    if !input_root.is_dir() {
        return Err(RunnerError::InputRootMissing(input_root.to_path_buf()));
    }

    let walker = WalkDir::new(input_root)
        .follow_links(true)
        .sort_by_file_name();

    let mut items = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_dir() || !entry.path().join(companion_file).is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(input_root) else {
            continue;
        };
        let subdirectory = relative.to_string_lossy().into_owned();
        if subdirectory.is_empty() {
            // Data directly under the root has no subdirectory to mirror.
            debug!("ignoring data at the input root itself");
            continue;
        }

        for data_file in data_files {
            if entry.path().join(data_file).is_file() {
                items.push(WorkItem::new(subdirectory.clone(), data_file.clone()));
            }
        }
    }

    info!(
        root = %input_root.display(),
        count = items.len(),
        "found candidate extrapolations"
    );
    Ok(items)
}
