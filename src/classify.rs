//! Sorting candidates into selection categories by inspecting output state.
//!
//! The extrapolation writes marker files next to its output:
//! `.started_<DataFile>`, `.finished_<DataFile>` and `.error_<DataFile>`.
//! [`MarkerInspector`] reads them; any other [`InspectOutput`] can stand in.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;

/// Selection criterion for the run queue. Declaration order is the order in
/// which selected categories are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Unstarted,
    NewerData,
    Unfinished,
    Errored,
    All,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Unstarted => write!(f, "unstarted"),
            Category::NewerData => write!(f, "newer-data"),
            Category::Unfinished => write!(f, "unfinished"),
            Category::Errored => write!(f, "errored"),
            Category::All => write!(f, "all"),
        }
    }
}

/// Boolean predicates over one item's output state.
pub trait InspectOutput {
    /// No output has been produced for the item yet.
    fn is_unstarted(&self, item: &WorkItem) -> bool;
    /// A completed output exists but the input data is newer.
    fn has_newer_data(&self, item: &WorkItem) -> bool;
    /// An output was started and neither finished nor failed.
    fn is_unfinished(&self, item: &WorkItem) -> bool;
    /// The output records a failure.
    fn is_errored(&self, item: &WorkItem) -> bool;
}

/// Reads the marker files left in each item's output directory.
#[derive(Debug, Clone)]
pub struct MarkerInspector {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl MarkerInspector {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
        }
    }
}

/// Marker file `.<kind>_<DataFile>` inside the item's output directory.
pub fn marker_path(output_root: &Path, item: &WorkItem, kind: &str) -> PathBuf {
    item.output_dir(output_root)
        .join(format!(".{kind}_{}", item.data_file))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl InspectOutput for MarkerInspector {
    fn is_unstarted(&self, item: &WorkItem) -> bool {
        !marker_path(&self.output_root, item, "started").exists()
    }

    fn has_newer_data(&self, item: &WorkItem) -> bool {
        let finished = modified(&marker_path(&self.output_root, item, "finished"));
        let data = modified(&item.input_path(&self.input_root));
        matches!((finished, data), (Some(finished), Some(data)) if data > finished)
    }

    fn is_unfinished(&self, item: &WorkItem) -> bool {
        marker_path(&self.output_root, item, "started").exists()
            && !marker_path(&self.output_root, item, "finished").exists()
            && !marker_path(&self.output_root, item, "error").exists()
    }

    fn is_errored(&self, item: &WorkItem) -> bool {
        marker_path(&self.output_root, item, "error").exists()
    }
}

/// Candidates split by category. Subsets may overlap; each keeps the
/// candidates' order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub unstarted: Vec<WorkItem>,
    pub newer_data: Vec<WorkItem>,
    pub unfinished: Vec<WorkItem>,
    pub errored: Vec<WorkItem>,
}

impl Classification {
    pub fn compute(inspector: &impl InspectOutput, candidates: &[WorkItem]) -> Self {
        Self {
            unstarted: select(candidates, |item| inspector.is_unstarted(item)),
            newer_data: select(candidates, |item| inspector.has_newer_data(item)),
            unfinished: select(candidates, |item| inspector.is_unfinished(item)),
            errored: select(candidates, |item| inspector.is_errored(item)),
        }
    }

    /// Items for one category. `All` has no subset of its own here; the
    /// queue builder substitutes the full candidate list for it.
    pub fn get(&self, category: Category) -> &[WorkItem] {
        match category {
            Category::Unstarted => &self.unstarted,
            Category::NewerData => &self.newer_data,
            Category::Unfinished => &self.unfinished,
            Category::Errored => &self.errored,
            Category::All => &[],
        }
    }
}

fn select(candidates: &[WorkItem], pred: impl Fn(&WorkItem) -> bool) -> Vec<WorkItem> {
    candidates.iter().filter(|item| pred(item)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&output).unwrap();
        Fixture { _dir: dir, input, output }
    }

    #[test]
    fn unstarted_without_markers() {
        let fx = fixture();
        let item = WorkItem::new("A", "d1");
        let inspector = MarkerInspector::new(&fx.input, &fx.output);
        assert!(inspector.is_unstarted(&item));
        assert!(!inspector.is_unfinished(&item));
        assert!(!inspector.is_errored(&item));
        assert!(!inspector.has_newer_data(&item));
    }

    #[test]
    fn started_only_is_unfinished() {
        let fx = fixture();
        let item = WorkItem::new("A", "d1");
        touch(&marker_path(&fx.output, &item, "started"));
        let inspector = MarkerInspector::new(&fx.input, &fx.output);
        assert!(!inspector.is_unstarted(&item));
        assert!(inspector.is_unfinished(&item));
    }

    #[test]
    fn error_marker_is_errored_not_unfinished() {
        let fx = fixture();
        let item = WorkItem::new("A", "d1");
        touch(&marker_path(&fx.output, &item, "started"));
        touch(&marker_path(&fx.output, &item, "error"));
        let inspector = MarkerInspector::new(&fx.input, &fx.output);
        assert!(inspector.is_errored(&item));
        assert!(!inspector.is_unfinished(&item));
    }

    #[test]
    fn newer_data_compares_mtimes() {
        let fx = fixture();
        let item = WorkItem::new("A", "d1");
        let data = item.input_path(&fx.input);
        let finished = marker_path(&fx.output, &item, "finished");
        touch(&data);
        touch(&finished);

        let now = SystemTime::now();
        set_mtime(&finished, now - Duration::from_secs(3600));
        set_mtime(&data, now);
        let inspector = MarkerInspector::new(&fx.input, &fx.output);
        assert!(inspector.has_newer_data(&item));

        set_mtime(&data, now - Duration::from_secs(7200));
        assert!(!inspector.has_newer_data(&item));
    }

    struct FixedInspector;

    impl InspectOutput for FixedInspector {
        fn is_unstarted(&self, item: &WorkItem) -> bool {
            item.subdirectory == "A"
        }
        fn has_newer_data(&self, item: &WorkItem) -> bool {
            item.subdirectory != "C"
        }
        fn is_unfinished(&self, _item: &WorkItem) -> bool {
            false
        }
        fn is_errored(&self, item: &WorkItem) -> bool {
            item.subdirectory == "C"
        }
    }

    #[test]
    fn compute_builds_overlapping_subsets_in_candidate_order() {
        let candidates = vec![
            WorkItem::new("A", "d1"),
            WorkItem::new("B", "d2"),
            WorkItem::new("C", "d3"),
        ];
        let c = Classification::compute(&FixedInspector, &candidates);
        assert_eq!(c.unstarted, vec![WorkItem::new("A", "d1")]);
        assert_eq!(
            c.newer_data,
            vec![WorkItem::new("A", "d1"), WorkItem::new("B", "d2")]
        );
        assert!(c.unfinished.is_empty());
        assert_eq!(c.get(Category::Errored), &[WorkItem::new("C", "d3")]);
        assert!(c.get(Category::All).is_empty());
    }

    #[test]
    fn category_order_is_fixed() {
        let mut cats = vec![
            Category::Errored,
            Category::Unstarted,
            Category::Unfinished,
            Category::NewerData,
        ];
        cats.sort();
        assert_eq!(
            cats,
            vec![
                Category::Unstarted,
                Category::NewerData,
                Category::Unfinished,
                Category::Errored
            ]
        );
    }
}
