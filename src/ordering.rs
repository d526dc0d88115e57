//! Structural edits on an entry's task list.
//!
//! Every operation here leaves `index` equal to the list position of each
//! task, so callers never have to renumber by hand.

use tracing::debug;

use crate::models::{Task, TaskId};

/// Assign `index = position` for every task, in list order
pub fn reindex(tasks: &mut [Task]) {
    for (position, task) in tasks.iter_mut().enumerate() {
        task.index = position;
    }
}

/// True when the indices form the dense sequence `0..n-1` in list order
pub fn is_dense(tasks: &[Task]) -> bool {
    tasks.iter().enumerate().all(|(position, task)| task.index == position)
}

/// Move the tasks at `from` so they start at offset `to`.
///
/// `to` is an offset into the list as it was before the move, clamped to the
/// list length. Moved tasks keep their relative order. When `to` falls inside
/// the moved block the block lands on the nearest boundary left after the
/// removal, which for a contiguous block means it stays where it was.
/// Positions outside the list are ignored.
pub fn move_tasks(tasks: &mut Vec<Task>, from: &[usize], to: usize) {
    let mut sources: Vec<usize> = from.iter().copied().filter(|&i| i < tasks.len()).collect();
    sources.sort_unstable();
    sources.dedup();

    if sources.is_empty() {
        reindex(tasks);
        return;
    }

    let to = to.min(tasks.len());
    let removed_before_target = sources.iter().filter(|&&i| i < to).count();

    let mut moved = Vec::with_capacity(sources.len());
    for &source in sources.iter().rev() {
        moved.push(tasks.remove(source));
    }
    moved.reverse();

    let destination = (to - removed_before_target).min(tasks.len());
    debug!(count = moved.len(), destination, "moving tasks");
    tasks.splice(destination..destination, moved);
    reindex(tasks);
}

/// Insert `new_task` directly after `anchor`, or at the end when the anchor
/// is `None` or no longer in the list. Returns the position it landed at.
pub fn insert_after(tasks: &mut Vec<Task>, anchor: Option<TaskId>, new_task: Task) -> usize {
    let position = anchor
        .and_then(|id| tasks.iter().position(|task| task.id == id))
        .map(|anchor_position| anchor_position + 1)
        .unwrap_or(tasks.len());

    tasks.insert(position, new_task);
    reindex(tasks);
    position
}

/// Remove the task with identity `target`. Tasks with equal fields but a
/// different id are left alone.
pub fn remove(tasks: &mut Vec<Task>, target: TaskId) -> Option<Task> {
    let position = tasks.iter().position(|task| task.id == target)?;
    let removed = tasks.remove(position);
    reindex(tasks);
    Some(removed)
}

/// Task directly before `id` in list order
pub fn task_before(tasks: &[Task], id: TaskId) -> Option<&Task> {
    let position = tasks.iter().position(|task| task.id == id)?;
    position.checked_sub(1).and_then(|before| tasks.get(before))
}

/// Task directly after `id` in list order
pub fn task_after(tasks: &[Task], id: TaskId) -> Option<&Task> {
    let position = tasks.iter().position(|task| task.id == id)?;
    tasks.get(position + 1)
}
