use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One unit of batch work: a data file inside a subdirectory of the input root.
///
/// The pair is the item's identity everywhere, including the ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItem {
    pub subdirectory: String,
    pub data_file: String,
}

impl WorkItem {
    pub fn new(subdirectory: impl Into<String>, data_file: impl Into<String>) -> Self {
        Self {
            subdirectory: subdirectory.into(),
            data_file: data_file.into(),
        }
    }

    /// Location of the input data file under `input_root`.
    pub fn input_path(&self, input_root: &Path) -> PathBuf {
        input_root.join(&self.subdirectory).join(&self.data_file)
    }

    /// Directory that receives this item's output under `output_root`.
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.subdirectory)
    }

    /// Data file name without its extension, used to name per-item scripts.
    pub fn stem(&self) -> &str {
        Path::new(&self.data_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.data_file)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subdirectory, self.data_file)
    }
}
