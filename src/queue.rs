//! Builds the ordered run queue from category selections.

use std::collections::{BTreeSet, HashSet};

use crate::classify::{Category, Classification};
use crate::item::WorkItem;

/// Removes repeated items, keeping each at its first position.
pub fn dedup(items: impl IntoIterator<Item = WorkItem>) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Rotates left by `offset`: `items[offset..] ++ items[..offset]`.
///
/// Offsets past the end clamp to the length, which leaves the order as is.
pub fn rotate(mut items: Vec<WorkItem>, offset: usize) -> Vec<WorkItem> {
    let offset = offset.min(items.len());
    items.rotate_left(offset);
    items
}

/// Merges the selected categories into a deduplicated, rotated queue.
///
/// Selecting [`Category::All`] takes `candidates` verbatim and ignores every
/// other category. Otherwise categories are concatenated in their fixed order.
/// An empty selection means `{Unstarted}`.
pub fn build_queue(
    selected: &BTreeSet<Category>,
    classification: &Classification,
    candidates: &[WorkItem],
    offset: usize,
) -> Vec<WorkItem> {
    let merged: Vec<WorkItem> = if selected.contains(&Category::All) {
        candidates.to_vec()
    } else if selected.is_empty() {
        classification.get(Category::Unstarted).to_vec()
    } else {
        selected
            .iter()
            .flat_map(|category| classification.get(*category).iter().cloned())
            .collect()
    };

    rotate(dedup(merged), offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<WorkItem> {
        names.iter().map(|n| WorkItem::new(*n, "d")).collect()
    }

    fn classification() -> Classification {
        Classification {
            unstarted: items(&["A", "B"]),
            newer_data: items(&["C", "A"]),
            unfinished: items(&["D"]),
            errored: items(&["B", "E"]),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup(items(&["A", "B", "A", "C", "B"])), items(&["A", "B", "C"]));
    }

    #[test]
    fn rotate_splits_and_swaps() {
        assert_eq!(rotate(items(&["A", "B", "C", "D"]), 1), items(&["B", "C", "D", "A"]));
        assert_eq!(rotate(items(&["A", "B", "C", "D"]), 0), items(&["A", "B", "C", "D"]));
    }

    #[test]
    fn rotate_at_length_is_identity() {
        let seq = items(&["A", "B", "C"]);
        assert_eq!(rotate(seq.clone(), 3), seq);
    }

    #[test]
    fn rotate_past_length_is_identity() {
        let seq = items(&["A", "B", "C"]);
        assert_eq!(rotate(seq.clone(), 10), seq);
        assert!(rotate(Vec::new(), 4).is_empty());
    }

    #[test]
    fn rotate_is_invertible_and_preserves_items() {
        let seq = items(&["A", "B", "C", "D", "E"]);
        for k in 0..=seq.len() {
            let rotated = rotate(seq.clone(), k);
            let mut sorted = rotated.clone();
            sorted.sort();
            assert_eq!(sorted, seq);
            assert_eq!(rotate(rotated, seq.len() - k), seq);
        }
    }

    #[test]
    fn empty_selection_defaults_to_unstarted() {
        let queue = build_queue(&BTreeSet::new(), &classification(), &[], 0);
        assert_eq!(queue, items(&["A", "B"]));
    }

    #[test]
    fn categories_concatenate_in_fixed_order_then_dedup() {
        let selected =
            BTreeSet::from([Category::Errored, Category::NewerData, Category::Unstarted]);
        let queue = build_queue(&selected, &classification(), &[], 0);
        assert_eq!(queue, items(&["A", "B", "C", "E"]));
    }

    #[test]
    fn all_ignores_other_categories() {
        let candidates = items(&["X", "Y", "X", "Z"]);
        let selected = BTreeSet::from([Category::All, Category::Unstarted, Category::Errored]);
        let queue = build_queue(&selected, &classification(), &candidates, 1);
        assert_eq!(queue, items(&["Y", "Z", "X"]));
    }

    #[test]
    fn offset_applies_after_dedup() {
        let selected = BTreeSet::from([Category::Unstarted, Category::Errored]);
        let queue = build_queue(&selected, &classification(), &[], 2);
        assert_eq!(queue, items(&["E", "A", "B"]));
    }
}
