//! In-memory entry collection, written through to SQLite on every change.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::creation::{self, CreationPolicy, Trigger};
use crate::database::{Database, StoreError};
use crate::editing::{self, EditKey, EditOutcome, FocusController};
use crate::models::{Entry, EntryId, EntryType, Icon, Task, TaskId};
use crate::ordering;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}

pub struct EntryRepository {
    db: Database,
    entries: Vec<Entry>,
    policy: CreationPolicy,
    revision: u64,
}

impl EntryRepository {
    /// Load every stored entry
    pub fn open(db: Database, policy: CreationPolicy) -> Result<Self, RepositoryError> {
        let mut entries = db.load_entries()?;
        entries.sort_by_key(|entry| entry.timestamp);
        info!(count = entries.len(), "loaded entries");
        Ok(Self {
            db,
            entries,
            policy,
            revision: 0,
        })
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn policy(&self) -> CreationPolicy {
        self.policy
    }

    /// Bumped on every successful mutation; views re-derive when it changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn find_entry(&self, date: NaiveDate, entry_type: EntryType) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.is_on(date) && entry.entry_type == entry_type)
    }

    pub fn entries_on(&self, date: NaiveDate) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(move |entry| entry.is_on(date))
    }

    /// Latest daily entry dated strictly before `date`
    pub fn find_most_recent_daily_entry_before(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.is_daily() && entry.date() < date)
    }

    /// Latest entry of any type, dated strictly before `date`, that has tasks
    pub fn find_most_recent_entry_with_tasks(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.date() < date && entry.has_tasks())
    }

    /// Create an entry unless one with the same day and type exists, in which
    /// case that one is returned untouched
    pub fn create_entry(
        &mut self,
        date: NaiveDate,
        entry_type: EntryType,
        initial_tasks: Vec<Task>,
    ) -> Result<&Entry, RepositoryError> {
        if let Some(existing) = self.find_entry(date, entry_type) {
            let id = existing.id;
            debug!(%date, %entry_type, "entry already exists");
            return self.entry(id).ok_or(RepositoryError::EntryNotFound(id));
        }

        let entry = Entry::on_date(date, entry_type, initial_tasks);
        self.db.insert_entry(&entry)?;
        info!(%date, %entry_type, tasks = entry.tasks.len(), "created entry");

        let id = entry.id;
        let position = self
            .entries
            .partition_point(|other| other.timestamp <= entry.timestamp);
        self.entries.insert(position, entry);
        self.bump();
        self.entry(id).ok_or(RepositoryError::EntryNotFound(id))
    }

    /// Remove an entry and its tasks
    pub fn delete_entry(&mut self, id: EntryId) -> Result<Entry, RepositoryError> {
        let position = self.position_of(id)?;
        self.db.delete_entry(id)?;
        let removed = self.entries.remove(position);
        info!(entry = %id, date = %removed.date(), "deleted entry");
        self.bump();
        Ok(removed)
    }

    pub fn set_entry_type(&mut self, id: EntryId, entry_type: EntryType) -> Result<(), RepositoryError> {
        self.mutate(id, |entry| {
            entry.entry_type = entry_type;
        })
    }

    pub fn insert_task_after(
        &mut self,
        id: EntryId,
        anchor: Option<TaskId>,
        new_task: Task,
    ) -> Result<usize, RepositoryError> {
        self.mutate(id, |entry| ordering::insert_after(&mut entry.tasks, anchor, new_task))
    }

    /// Remove a task by identity; a task that is already gone is not an error.
    /// Removing the last task leaves a blank placeholder behind.
    pub fn remove_task(&mut self, id: EntryId, task_id: TaskId) -> Result<Option<Task>, RepositoryError> {
        self.mutate(id, |entry| {
            let removed = ordering::remove(&mut entry.tasks, task_id);
            creation::ensure_placeholder(&mut entry.tasks);
            removed
        })
    }

    pub fn move_tasks(&mut self, id: EntryId, from: &[usize], to: usize) -> Result<(), RepositoryError> {
        self.mutate(id, |entry| ordering::move_tasks(&mut entry.tasks, from, to))
    }

    /// Shift a task's indent by `delta`, clamped at zero. Returns the new indent.
    pub fn set_task_indent(&mut self, id: EntryId, task_id: TaskId, delta: i32) -> Result<u16, RepositoryError> {
        self.mutate_task(id, task_id, |task| {
            task.indent = editing::adjust_indent(task.indent, delta);
            task.indent
        })
    }

    pub fn set_task_label(&mut self, id: EntryId, task_id: TaskId, label: &str) -> Result<(), RepositoryError> {
        self.mutate_task(id, task_id, |task| {
            task.label = label.to_string();
        })
    }

    pub fn set_task_icon(&mut self, id: EntryId, task_id: TaskId, icon: Icon) -> Result<(), RepositoryError> {
        self.mutate_task(id, task_id, |task| {
            task.icon = icon;
        })
    }

    /// Run an editing key against an entry, persisting only when the task
    /// list changed
    pub fn apply_edit(
        &mut self,
        id: EntryId,
        focus: &mut FocusController,
        task_id: TaskId,
        key: EditKey,
    ) -> Result<EditOutcome, RepositoryError> {
        let position = self.position_of(id)?;
        let mut updated = self.entries[position].clone();
        let mut next_focus = focus.clone();
        let outcome = editing::apply_edit_key(&mut updated, &mut next_focus, task_id, key);
        if outcome.is_mutation() {
            self.db.save_entry(&updated)?;
            self.entries[position] = updated;
            self.bump();
        }
        *focus = next_focus;
        Ok(outcome)
    }

    /// Entry to show for `date` when the user navigates there.
    ///
    /// Returns the existing entry of the date's type, creates one when the
    /// past-date policy allows it, or `None` to show the day as empty.
    pub fn ensure_entry_for_date(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Option<EntryId>, RepositoryError> {
        let entry_type = self.policy.classify_date(date);
        if let Some(existing) = self.find_entry(date, entry_type) {
            return Ok(Some(existing.id));
        }
        if !self.policy.allows_auto_create(date, today) {
            debug!(%date, "past date left empty");
            return Ok(None);
        }

        let tasks = self.starting_tasks(date, entry_type, Trigger::Navigation);
        let entry = self.create_entry(date, entry_type, tasks)?;
        Ok(Some(entry.id))
    }

    /// User-triggered "Add Daily" / "Add Weekly"
    pub fn add_manual_entry(&mut self, date: NaiveDate, entry_type: EntryType) -> Result<EntryId, RepositoryError> {
        if let Some(existing) = self.find_entry(date, entry_type) {
            return Ok(existing.id);
        }
        let tasks = self.starting_tasks(date, entry_type, Trigger::Manual);
        let entry = self.create_entry(date, entry_type, tasks)?;
        Ok(entry.id)
    }

    fn starting_tasks(&self, date: NaiveDate, entry_type: EntryType, trigger: Trigger) -> Vec<Task> {
        let mut tasks = match entry_type {
            EntryType::Daily => {
                creation::carry_forward_daily(self.find_most_recent_daily_entry_before(date), trigger)
            }
            EntryType::Weekly => creation::aggregate_weekly(&self.entries, date),
        };
        creation::ensure_placeholder(&mut tasks);
        tasks
    }

    /// Apply `change` to a copy of the entry and swap it in only once the
    /// store has accepted it
    fn mutate<T>(&mut self, id: EntryId, change: impl FnOnce(&mut Entry) -> T) -> Result<T, RepositoryError> {
        let position = self.position_of(id)?;
        let mut updated = self.entries[position].clone();
        let result = change(&mut updated);
        ordering::reindex(&mut updated.tasks);
        self.commit(position, updated)?;
        Ok(result)
    }

    fn mutate_task<T>(
        &mut self,
        id: EntryId,
        task_id: TaskId,
        change: impl FnOnce(&mut Task) -> T,
    ) -> Result<T, RepositoryError> {
        let position = self.position_of(id)?;
        let mut updated = self.entries[position].clone();
        let task = updated
            .task_mut(task_id)
            .ok_or(RepositoryError::TaskNotFound(task_id))?;
        let result = change(task);
        self.commit(position, updated)?;
        Ok(result)
    }

    fn commit(&mut self, position: usize, updated: Entry) -> Result<(), RepositoryError> {
        if let Err(e) = self.db.save_entry(&updated) {
            warn!(entry = %updated.id, error = %e, "save failed, keeping previous state");
            return Err(e.into());
        }
        self.entries[position] = updated;
        self.bump();
        Ok(())
    }

    fn position_of(&self, id: EntryId) -> Result<usize, RepositoryError> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(RepositoryError::EntryNotFound(id))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
