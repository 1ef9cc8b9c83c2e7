//! Render-ready projection of the task collection.

use std::cmp::Ordering;

use serde::Serialize;

use crate::collection::TaskCollection;
use crate::task::Task;

/// Ordered tasks plus aggregate statistics.
///
/// Entirely derived from a [`TaskCollection`] and the archived task count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// Unchecked tasks first, each partition newest first.
    pub tasks: Vec<Task>,
    /// Number of checked tasks.
    pub completed_count: usize,
    /// Number of active tasks.
    pub total_count: usize,
    /// `completed_count / total_count` as a percentage, `0` when empty.
    pub completion_ratio: f64,
    /// Number of archived tasks.
    pub deleted_count: usize,
    /// Share of active tasks among active plus archived, as a percentage.
    pub active_share: f64,
    /// Share of archived tasks among active plus archived, as a percentage.
    pub archived_share: f64,
}

impl ViewModel {
    /// Number of unchecked tasks.
    #[must_use]
    pub const fn remaining_count(&self) -> usize {
        self.total_count - self.completed_count
    }
}

/// Build the view model for a collection and archive size.
///
/// Recency is approximated by comparing ids in reverse lexicographic order,
/// which assumes the store hands out time-ordered keys.
#[must_use]
pub fn build_view_model(tasks: &TaskCollection, deleted_count: usize) -> ViewModel {
    let mut ordered: Vec<Task> = tasks.iter().cloned().collect();
    ordered.sort_by(compare_for_display);

    let total_count = ordered.len();
    let completed_count = ordered.iter().filter(|task| task.is_checked).count();
    let archive_total = total_count + deleted_count;

    ViewModel {
        tasks: ordered,
        completed_count,
        total_count,
        completion_ratio: percent(completed_count, total_count),
        deleted_count,
        active_share: percent(total_count, archive_total),
        archived_share: percent(deleted_count, archive_total),
    }
}

fn compare_for_display(a: &Task, b: &Task) -> Ordering {
    a.is_checked
        .cmp(&b.is_checked)
        .then_with(|| b.id.cmp(&a.id))
}

/// `part / whole * 100`, defined as `0` for an empty whole.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]

    use super::*;
    use crate::id::TaskId;

    fn task(id: &str, checked: bool) -> Task {
        Task {
            id: id.parse::<TaskId>().unwrap(),
            text: format!("task {id}"),
            is_checked: checked,
        }
    }

    fn ids(view: &ViewModel) -> Vec<&str> {
        view.tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn unchecked_first_then_newest_first() {
        let tasks: TaskCollection = [task("a", false), task("b", true), task("c", false)]
            .into_iter()
            .collect();
        let view = build_view_model(&tasks, 0);
        assert_eq!(ids(&view), ["c", "a", "b"]);
    }

    #[test]
    fn checked_partition_is_also_newest_first() {
        let tasks: TaskCollection = [
            task("k1", true),
            task("k3", true),
            task("k2", false),
            task("k4", false),
        ]
        .into_iter()
        .collect();
        let view = build_view_model(&tasks, 0);
        assert_eq!(ids(&view), ["k4", "k2", "k3", "k1"]);
    }

    #[test]
    fn empty_collection_has_zero_ratios() {
        let view = build_view_model(&TaskCollection::default(), 0);
        assert!(view.tasks.is_empty());
        assert_eq!(view.completion_ratio, 0.0);
        assert_eq!(view.active_share, 0.0);
        assert_eq!(view.archived_share, 0.0);
    }

    #[test]
    fn completion_ratio_tracks_checked_share() {
        let one_of_three: TaskCollection = [task("a", true), task("b", false), task("c", false)]
            .into_iter()
            .collect();
        let view = build_view_model(&one_of_three, 0);
        assert_eq!(view.completed_count, 1);
        assert_eq!(view.total_count, 3);
        assert_eq!(view.remaining_count(), 2);
        assert!((view.completion_ratio - 33.333).abs() < 0.01);

        let all_done: TaskCollection = [task("a", true), task("b", true)].into_iter().collect();
        assert_eq!(build_view_model(&all_done, 0).completion_ratio, 100.0);
    }

    #[test]
    fn archive_shares_cover_active_and_deleted() {
        let tasks: TaskCollection = [task("a", false)].into_iter().collect();
        let view = build_view_model(&tasks, 3);
        assert_eq!(view.deleted_count, 3);
        assert_eq!(view.active_share, 25.0);
        assert_eq!(view.archived_share, 75.0);

        let only_archive = build_view_model(&TaskCollection::default(), 2);
        assert_eq!(only_archive.completion_ratio, 0.0);
        assert_eq!(only_archive.archived_share, 100.0);
    }

    #[test]
    fn building_twice_is_deterministic() {
        let tasks: TaskCollection = [task("x", true), task("y", false)].into_iter().collect();
        assert_eq!(build_view_model(&tasks, 1), build_view_model(&tasks, 1));
    }
}
