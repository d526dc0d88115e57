//! Keyboard-driven editing of an entry's task list.
//!
//! Focus lives in a [`FocusController`] owned by whoever hosts the editor and
//! handed in by reference. The key handler mutates the entry's task list
//! through [`crate::ordering`] and moves focus the way a line-oriented outliner
//! does.

use crate::models::{Entry, Task, TaskId};
use crate::ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Focused,
    Editing,
}

/// Single owner of "which task has the cursor"
#[derive(Debug, Clone, Default)]
pub struct FocusController {
    focused: Option<TaskId>,
    editing: bool,
}

impl FocusController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus `id`; every other task becomes idle
    pub fn request_focus(&mut self, id: TaskId) {
        self.focused = Some(id);
    }

    pub fn current_focus(&self) -> Option<TaskId> {
        self.focused
    }

    pub fn clear(&mut self) {
        self.focused = None;
        self.editing = false;
    }

    pub fn begin_editing(&mut self) {
        if self.focused.is_some() {
            self.editing = true;
        }
    }

    pub fn end_editing(&mut self) {
        self.editing = false;
    }

    pub fn is_editing(&self) -> bool {
        self.editing && self.focused.is_some()
    }

    pub fn state_of(&self, id: TaskId) -> EditState {
        match self.focused {
            Some(focused) if focused == id && self.editing => EditState::Editing,
            Some(focused) if focused == id => EditState::Focused,
            _ => EditState::Idle,
        }
    }

    /// Keep focus valid after the task list changed underneath it: fall back
    /// to the first task, or nothing for an empty list.
    pub fn reconcile(&mut self, tasks: &[Task]) {
        let still_present = self
            .focused
            .is_some_and(|id| tasks.iter().any(|task| task.id == id));
        if !still_present {
            self.focused = tasks.first().map(|task| task.id);
            if self.focused.is_none() {
                self.editing = false;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    /// Return: open a new blank task below
    Commit,
    DeleteForward,
    /// Backspace pressed while the label is empty
    BackspaceOnEmpty,
    IndentIncrease,
    IndentDecrease,
    FocusUp,
    FocusDown,
}

/// What a key did to the entry, so the host knows whether to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Inserted(TaskId),
    Removed(TaskId),
    Indented { id: TaskId, indent: u16 },
    FocusMoved(TaskId),
    Unchanged,
}

impl EditOutcome {
    /// True when the task list itself changed
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            EditOutcome::Inserted(_) | EditOutcome::Removed(_) | EditOutcome::Indented { .. }
        )
    }
}

/// Apply `delta` to an indent, clamping at zero
pub fn adjust_indent(indent: u16, delta: i32) -> u16 {
    let adjusted = i64::from(indent) + i64::from(delta);
    adjusted.clamp(0, i64::from(u16::MAX)) as u16
}

/// Run one editing key against `task_id` in `entry`
pub fn apply_edit_key(
    entry: &mut Entry,
    focus: &mut FocusController,
    task_id: TaskId,
    key: EditKey,
) -> EditOutcome {
    let Some(task) = entry.task(task_id) else {
        return EditOutcome::Unchanged;
    };
    let indent = task.indent;
    let label_is_empty = task.label.is_empty();

    match key {
        EditKey::Commit => {
            let new_task = Task::blank();
            let new_id = new_task.id;
            ordering::insert_after(&mut entry.tasks, Some(task_id), new_task);
            focus.request_focus(new_id);
            EditOutcome::Inserted(new_id)
        }
        EditKey::DeleteForward => {
            ordering::remove(&mut entry.tasks, task_id);
            if entry.tasks.is_empty() {
                let placeholder = Task::blank();
                focus.request_focus(placeholder.id);
                ordering::insert_after(&mut entry.tasks, None, placeholder);
            }
            EditOutcome::Removed(task_id)
        }
        EditKey::BackspaceOnEmpty => {
            if !label_is_empty {
                return EditOutcome::Unchanged;
            }
            if indent > 0 {
                return set_indent(entry, task_id, adjust_indent(indent, -1));
            }
            if entry.tasks.len() <= 1 {
                // the last task stays as the editing placeholder
                return EditOutcome::Unchanged;
            }
            let previous = ordering::task_before(&entry.tasks, task_id).map(|t| t.id);
            ordering::remove(&mut entry.tasks, task_id);
            if let Some(previous) = previous {
                focus.request_focus(previous);
            }
            EditOutcome::Removed(task_id)
        }
        EditKey::IndentIncrease => set_indent(entry, task_id, adjust_indent(indent, 1)),
        EditKey::IndentDecrease => {
            if indent == 0 {
                return EditOutcome::Unchanged;
            }
            set_indent(entry, task_id, adjust_indent(indent, -1))
        }
        EditKey::FocusUp => match ordering::task_before(&entry.tasks, task_id) {
            Some(previous) => {
                let id = previous.id;
                focus.request_focus(id);
                EditOutcome::FocusMoved(id)
            }
            None => EditOutcome::Unchanged,
        },
        EditKey::FocusDown => match ordering::task_after(&entry.tasks, task_id) {
            Some(next) => {
                let id = next.id;
                focus.request_focus(id);
                EditOutcome::FocusMoved(id)
            }
            None => EditOutcome::Unchanged,
        },
    }
}

fn set_indent(entry: &mut Entry, task_id: TaskId, indent: u16) -> EditOutcome {
    match entry.task_mut(task_id) {
        Some(task) => {
            task.indent = indent;
            EditOutcome::Indented { id: task_id, indent }
        }
        None => EditOutcome::Unchanged,
    }
}
