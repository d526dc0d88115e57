use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::editing::{EditKey, EditOutcome, FocusController};
use crate::export::{format_entry_as_plain_text, format_status_report};
use crate::models::{self, Entry, EntryId, EntryType, Task, TaskId};
use crate::repository::{EntryRepository, RepositoryError};
use crate::summary::{self, GeminiClient, LinearClient, SummaryError, SummaryResult, SummaryStage};
use crate::ticket::{Ticket, TicketCounter};
use crate::timeline::{self, DayBucket, Direction, TimelineCursor};
use crate::tui::error::TuiError;
use crate::tui::widgets::editor::Editor;
use crate::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Editing,
    Help,
    ConfirmDelete,
    Summary,
}

/// Dates shown in the strip and what is on each of them
pub struct TimelineState {
    pub today: NaiveDate,
    pub window: Vec<NaiveDate>,
    pub buckets: Vec<DayBucket>,
    pub cursor: TimelineCursor,
    pub direction: Direction,
}

pub struct UiState {
    pub mode: Mode,
    /// Entry shown below the timeline, if the selected day has one
    pub current_entry: Option<EntryId>,
    pub delete_modal_selection: usize,
    pub summary_scroll: u16,
}

pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

/// Navigation waiting to be resolved on the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNavigation {
    pub ticket: Ticket,
    pub date: NaiveDate,
}

#[derive(Debug)]
pub enum SummaryState {
    Idle,
    Loading(SummaryStage),
    Ready(SummaryResult),
    Failed(String),
}

#[derive(Debug)]
pub enum SummaryMessage {
    Stage(Ticket, SummaryStage),
    Finished(Ticket, Result<SummaryResult, SummaryError>),
}

pub struct SummaryPanel {
    pub state: SummaryState,
    pub tickets: TicketCounter,
    sender: UnboundedSender<SummaryMessage>,
    receiver: UnboundedReceiver<SummaryMessage>,
    runtime: Option<tokio::runtime::Runtime>,
}

impl SummaryPanel {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state: SummaryState::Idle,
            tickets: TicketCounter::new(),
            sender,
            receiver,
            runtime: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SummaryState::Loading(_))
    }
}

pub struct App {
    pub config: Config,
    pub repository: EntryRepository,
    pub focus: FocusController,
    pub editor: Editor,

    pub timeline: TimelineState,
    pub ui: UiState,
    pub status: StatusState,
    pub summary: SummaryPanel,

    navigation: TicketCounter,
    pending_navigation: Option<PendingNavigation>,
    seen_revision: Option<u64>,
    clipboard: Box<dyn ClipboardSink>,
}

impl App {
    pub fn new(config: Config, repository: EntryRepository) -> Result<Self, TuiError> {
        Ok(Self::with_clipboard(
            config,
            repository,
            models::today(),
            Box::new(SystemClipboard),
        ))
    }

    /// Build an app for a fixed `today` with the given clipboard
    pub fn with_clipboard(
        config: Config,
        repository: EntryRepository,
        today: NaiveDate,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        let window = timeline::date_window(today, config.timeline.days_back, config.timeline.days_ahead);
        let buckets = timeline::bucketize(repository.entries(), &window);

        let mut app = Self {
            config,
            repository,
            focus: FocusController::new(),
            editor: Editor::new(),
            timeline: TimelineState {
                today,
                window,
                buckets,
                cursor: TimelineCursor::new(today),
                direction: Direction::None,
            },
            ui: UiState {
                mode: Mode::View,
                current_entry: None,
                delete_modal_selection: 0,
                summary_scroll: 0,
            },
            status: StatusState {
                message: None,
                message_time: None,
            },
            summary: SummaryPanel::new(),
            navigation: TicketCounter::new(),
            pending_navigation: None,
            seen_revision: None,
            clipboard,
        };
        app.navigate_to(today);
        app
    }

    // Entry and task lookups

    pub fn selected_date(&self) -> NaiveDate {
        self.timeline.cursor.selected()
    }

    pub fn current_entry(&self) -> Option<&Entry> {
        self.ui.current_entry.and_then(|id| self.repository.entry(id))
    }

    pub fn focused_task(&self) -> Option<&Task> {
        let id = self.focus.current_focus()?;
        self.current_entry()?.task(id)
    }

    pub fn focused_position(&self) -> Option<usize> {
        let id = self.focus.current_focus()?;
        self.current_entry()?.position_of(id)
    }

    pub fn pending_navigation(&self) -> Option<PendingNavigation> {
        self.pending_navigation
    }

    // Loop housekeeping

    /// Work done once per loop iteration before drawing
    pub fn tick(&mut self) {
        self.resolve_navigation();
        self.poll_summary();
        self.refresh_if_changed();
        self.check_status_message_timeout();
    }

    fn refresh_if_changed(&mut self) {
        let revision = self.repository.revision();
        if self.seen_revision == Some(revision) {
            return;
        }
        self.seen_revision = Some(revision);
        self.timeline.buckets = timeline::bucketize(self.repository.entries(), &self.timeline.window);

        if self.current_entry().is_none() {
            self.ui.current_entry = None;
        }
        let tasks = self.current_entry().map(|entry| entry.tasks.clone()).unwrap_or_default();
        self.focus.reconcile(&tasks);
        if self.ui.mode == Mode::Editing && !self.focus.is_editing() {
            self.ui.mode = Mode::View;
        }
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    /// Surface a failed mutation without leaving the loop
    fn report(&mut self, action: &str, error: RepositoryError) {
        warn!(error = %error, action, "mutation failed");
        self.set_status_message(format!("Failed to {}: {}", action, error));
    }

    // Timeline navigation

    /// Select `date` and queue entry resolution for the next tick. A newer
    /// navigation supersedes this one.
    pub fn navigate_to(&mut self, date: NaiveDate) {
        self.timeline.direction = self.timeline.cursor.select(date);
        self.queue_navigation(date);
    }

    pub fn step_day(&mut self, days: i64) {
        self.timeline.direction = self.timeline.cursor.step(days, &self.timeline.window);
        self.queue_navigation(self.timeline.cursor.selected());
    }

    pub fn go_to_today(&mut self) {
        self.navigate_to(self.timeline.today);
    }

    fn queue_navigation(&mut self, date: NaiveDate) {
        let ticket = self.navigation.issue();
        self.pending_navigation = Some(PendingNavigation { ticket, date });
        // show what already exists while the navigation is pending
        let existing = self.existing_entry_on(date);
        self.show_entry(existing);
    }

    fn resolve_navigation(&mut self) {
        let Some(pending) = self.pending_navigation.take() else {
            return;
        };
        if !self.navigation.is_current(pending.ticket) {
            debug!(date = %pending.date, "navigation superseded");
            return;
        }

        match self.repository.ensure_entry_for_date(pending.date, self.timeline.today) {
            Ok(Some(id)) => self.show_entry(Some(id)),
            Ok(None) => {
                let existing = self.existing_entry_on(pending.date);
                self.show_entry(existing);
            }
            Err(e) => self.report("create entry", e),
        }
    }

    /// Entry of the date's own type first, then any entry on that day
    fn existing_entry_on(&self, date: NaiveDate) -> Option<EntryId> {
        let entry_type = self.repository.policy().classify_date(date);
        self.repository
            .find_entry(date, entry_type)
            .or_else(|| self.repository.entries_on(date).next())
            .map(|entry| entry.id)
    }

    fn show_entry(&mut self, id: Option<EntryId>) {
        if self.ui.current_entry != id {
            self.focus.clear();
            if self.ui.mode == Mode::Editing {
                self.ui.mode = Mode::View;
            }
        }
        self.ui.current_entry = id;
        let tasks = self.current_entry().map(|entry| entry.tasks.clone()).unwrap_or_default();
        self.focus.reconcile(&tasks);
    }

    // Entry actions

    /// Manual "Add Daily" / "Add Weekly" for the selected day
    pub fn add_entry(&mut self, entry_type: EntryType) {
        let date = self.selected_date();
        match self.repository.add_manual_entry(date, entry_type) {
            Ok(id) => {
                self.show_entry(Some(id));
                self.set_status_message(format!("Showing {} entry for {}", entry_type, date));
            }
            Err(e) => self.report("add entry", e),
        }
    }

    pub fn toggle_entry_type(&mut self) {
        let Some(entry) = self.current_entry() else {
            self.set_status_message("No entry for this day");
            return;
        };
        let (id, date, target) = (entry.id, entry.date(), entry.entry_type.toggled());
        if self.repository.find_entry(date, target).is_some() {
            self.set_status_message(format!("A {} entry already exists for {}", target, date));
            return;
        }
        match self.repository.set_entry_type(id, target) {
            Ok(()) => self.set_status_message(format!("Entry is now {}", target)),
            Err(e) => self.report("change entry type", e),
        }
    }

    /// Step to the next entry on the selected day, wrapping around
    pub fn switch_entry(&mut self) {
        let date = self.selected_date();
        let ids: Vec<EntryId> = self.repository.entries_on(date).map(|entry| entry.id).collect();
        if ids.len() < 2 {
            self.set_status_message(format!("Only one entry on {}", date));
            return;
        }
        let next = self
            .ui
            .current_entry
            .and_then(|current| ids.iter().position(|id| *id == current))
            .map_or(0, |position| (position + 1) % ids.len());
        self.show_entry(Some(ids[next]));
        if let Some(entry) = self.current_entry() {
            let message = format!("Showing {} entry", entry.entry_type);
            self.set_status_message(message);
        }
    }

    pub fn copy_entry(&mut self) {
        let Some(entry) = self.current_entry() else {
            self.set_status_message("No entry for this day");
            return;
        };
        let text = format_entry_as_plain_text(entry);
        match self.clipboard.set_text(text) {
            Ok(()) => self.set_status_message("Copied entry to clipboard"),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    pub fn request_delete_entry(&mut self) {
        if self.current_entry().is_none() {
            self.set_status_message("No entry for this day");
            return;
        }
        self.ui.delete_modal_selection = 0;
        self.ui.mode = Mode::ConfirmDelete;
    }

    pub fn confirm_delete_entry(&mut self) {
        self.ui.mode = Mode::View;
        let Some(id) = self.ui.current_entry else {
            return;
        };
        match self.repository.delete_entry(id) {
            Ok(entry) => {
                self.show_entry(None);
                self.set_status_message(format!("Deleted {} entry for {}", entry.entry_type, entry.date()));
            }
            Err(e) => self.report("delete entry", e),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.ui.mode = Mode::View;
    }

    // Task actions in view mode

    pub fn move_focus(&mut self, key: EditKey) {
        let Some(task_id) = self.focus.current_focus() else {
            return;
        };
        self.apply_edit(task_id, key);
    }

    /// Insert a blank task after the focused one and start editing it
    pub fn new_task(&mut self) {
        let Some(id) = self.require_entry() else {
            return;
        };
        let task = Task::blank();
        let task_id = task.id;
        match self.repository.insert_task_after(id, self.focus.current_focus(), task) {
            Ok(_) => {
                self.focus.request_focus(task_id);
                self.begin_editing();
            }
            Err(e) => self.report("add task", e),
        }
    }

    pub fn delete_task(&mut self) {
        let (Some(id), Some(task_id)) = (self.ui.current_entry, self.focus.current_focus()) else {
            return;
        };
        let position = self.focused_position().unwrap_or_default();
        match self.repository.remove_task(id, task_id) {
            Ok(_) => self.focus_position(position),
            Err(e) => self.report("delete task", e),
        }
    }

    pub fn cycle_icon(&mut self) {
        let (Some(id), Some(task)) = (self.ui.current_entry, self.focused_task()) else {
            return;
        };
        let (task_id, icon) = (task.id, task.icon.next());
        if let Err(e) = self.repository.set_task_icon(id, task_id, icon) {
            self.report("change icon", e);
        }
    }

    pub fn shift_indent(&mut self, delta: i32) {
        let (Some(id), Some(task_id)) = (self.ui.current_entry, self.focus.current_focus()) else {
            return;
        };
        if let Err(e) = self.repository.set_task_indent(id, task_id, delta) {
            self.report("change indent", e);
        }
    }

    /// Move the focused task one row up (`-1`) or down (`1`)
    pub fn move_task(&mut self, offset: i32) {
        let (Some(id), Some(position)) = (self.ui.current_entry, self.focused_position()) else {
            return;
        };
        let len = self.current_entry().map_or(0, |entry| entry.tasks.len());
        let to = match offset {
            o if o < 0 && position > 0 => position - 1,
            // offsets are into the list before the move
            o if o > 0 && position + 1 < len => position + 2,
            _ => return,
        };
        if let Err(e) = self.repository.move_tasks(id, &[position], to) {
            self.report("move task", e);
        }
    }

    fn focus_position(&mut self, position: usize) {
        let tasks = self.current_entry().map(|entry| entry.tasks.clone()).unwrap_or_default();
        match tasks.get(position).or_else(|| tasks.last()) {
            Some(task) => self.focus.request_focus(task.id),
            None => self.focus.clear(),
        }
    }

    fn require_entry(&mut self) -> Option<EntryId> {
        if self.ui.current_entry.is_none() {
            let add_daily = crate::utils::format_key_binding_for_display(&self.config.key_bindings.add_daily);
            let add_weekly = crate::utils::format_key_binding_for_display(&self.config.key_bindings.add_weekly);
            self.set_status_message(format!(
                "No entry for this day ({}: add daily, {}: add weekly)",
                add_daily, add_weekly
            ));
        }
        self.ui.current_entry
    }

    // Label editing

    pub fn begin_editing(&mut self) {
        if self.require_entry().is_none() {
            return;
        }
        if self.focus.current_focus().is_none() {
            // an entry without tasks gets its first row
            self.new_task();
            return;
        }
        let label = self.focused_task().map(|task| task.label.clone()).unwrap_or_default();
        self.editor = Editor::from_string(label);
        self.focus.begin_editing();
        self.ui.mode = Mode::Editing;
    }

    /// Write the editor text back to the focused task
    pub fn commit_label(&mut self) {
        let (Some(id), Some(task)) = (self.ui.current_entry, self.focused_task()) else {
            return;
        };
        if task.label == self.editor.text {
            return;
        }
        let task_id = task.id;
        let label = self.editor.text.clone();
        if let Err(e) = self.repository.set_task_label(id, task_id, &label) {
            self.report("save label", e);
        }
    }

    pub fn end_editing(&mut self) {
        self.commit_label();
        self.focus.end_editing();
        self.ui.mode = Mode::View;
    }

    /// Editing keys that act on the task list rather than the label text
    pub fn edit_key(&mut self, key: EditKey) {
        let Some(task_id) = self.focus.current_focus() else {
            return;
        };
        self.commit_label();
        let position = self.focused_position().unwrap_or_default();
        let outcome = self.apply_edit(task_id, key);

        // delete forward leaves the cursor on the row that moved up
        if key == EditKey::DeleteForward && matches!(outcome, Some(EditOutcome::Removed(_))) {
            self.focus_position(position);
        }
        let tasks = self.current_entry().map(|entry| entry.tasks.clone()).unwrap_or_default();
        self.focus.reconcile(&tasks);

        if self.focus.current_focus() != Some(task_id) || matches!(outcome, Some(EditOutcome::Removed(_))) {
            let label = self.focused_task().map(|task| task.label.clone()).unwrap_or_default();
            self.editor = Editor::from_string(label);
        }
        if self.focus.current_focus().is_none() {
            self.focus.end_editing();
            self.ui.mode = Mode::View;
        } else if self.ui.mode == Mode::Editing {
            self.focus.begin_editing();
        }
    }

    /// Backspace while editing: a character, or the task itself when the
    /// label is empty
    pub fn backspace(&mut self) {
        if self.editor.is_empty() {
            self.edit_key(EditKey::BackspaceOnEmpty);
        } else {
            self.editor.delete_char();
        }
    }

    /// Delete while editing: a character, or the task once the label is empty
    pub fn delete_forward(&mut self) {
        if self.editor.is_empty() {
            self.edit_key(EditKey::DeleteForward);
        } else {
            self.editor.delete_forward();
        }
    }

    fn apply_edit(&mut self, task_id: TaskId, key: EditKey) -> Option<EditOutcome> {
        let id = self.ui.current_entry?;
        match self.repository.apply_edit(id, &mut self.focus, task_id, key) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.report("edit task", e);
                None
            }
        }
    }

    // Mode switches

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    /// Open the summary screen, starting a run if there is no result yet
    pub fn enter_summary_mode(&mut self) {
        self.ui.mode = Mode::Summary;
        self.ui.summary_scroll = 0;
        if matches!(self.summary.state, SummaryState::Idle) {
            self.request_summary();
        }
    }

    /// Leave the summary screen; a run still in flight is abandoned
    pub fn exit_summary_mode(&mut self) {
        if self.summary.is_loading() {
            self.summary.tickets.cancel_all();
            self.summary.state = SummaryState::Idle;
        }
        self.ui.mode = Mode::View;
    }

    // Status summary

    /// Start a summary run on the background runtime. Any earlier run is
    /// superseded.
    pub fn request_summary(&mut self) {
        let clients = LinearClient::new(self.config.linear_api_key().unwrap_or_default()).and_then(|linear| {
            let gemini = GeminiClient::new(
                self.config.gemini_api_key().unwrap_or_default(),
                self.config.summary.model.clone(),
            )?;
            Ok((linear, gemini))
        });
        let (linear, gemini) = match clients {
            Ok(clients) => clients,
            Err(e) => {
                warn!(error = %e, "summary unavailable");
                self.summary.state = SummaryState::Failed(e.to_string());
                return;
            }
        };

        if self.summary.runtime.is_none() {
            match tokio::runtime::Builder::new_multi_thread().worker_threads(1).enable_all().build() {
                Ok(runtime) => self.summary.runtime = Some(runtime),
                Err(e) => {
                    self.summary.state = SummaryState::Failed(format!("Failed to start runtime: {}", e));
                    return;
                }
            }
        }
        let Some(runtime) = self.summary.runtime.as_ref() else {
            return;
        };

        let request = self.config.summary_request();
        let ticket = self.summary.tickets.issue();
        let sender = self.summary.sender.clone();
        info!(days = request.days, generation = ticket.generation(), "starting summary");
        self.summary.state = SummaryState::Loading(SummaryStage::QueryingIssues { days: request.days });

        runtime.spawn(async move {
            let progress = sender.clone();
            let result = summary::summarize_status(&linear, &gemini, &request, move |stage| {
                let _ = progress.send(SummaryMessage::Stage(ticket, stage));
            })
            .await;
            // the receiver is gone only when the app is shutting down
            let _ = sender.send(SummaryMessage::Finished(ticket, result));
        });
    }

    /// Drain results from the background runtime, dropping stale ones
    pub fn poll_summary(&mut self) {
        while let Ok(message) = self.summary.receiver.try_recv() {
            self.handle_summary_message(message);
        }
    }

    pub fn handle_summary_message(&mut self, message: SummaryMessage) {
        let ticket = match &message {
            SummaryMessage::Stage(ticket, _) | SummaryMessage::Finished(ticket, _) => *ticket,
        };
        if !self.summary.tickets.is_current(ticket) {
            debug!(generation = ticket.generation(), "dropping stale summary message");
            return;
        }
        match message {
            SummaryMessage::Stage(_, stage) => {
                if self.summary.is_loading() {
                    self.summary.state = SummaryState::Loading(stage);
                }
            }
            SummaryMessage::Finished(_, Ok(result)) => {
                self.ui.summary_scroll = 0;
                self.summary.state = SummaryState::Ready(result);
            }
            SummaryMessage::Finished(_, Err(e)) => {
                warn!(error = %e, "summary failed");
                self.summary.state = SummaryState::Failed(e.to_string());
            }
        }
    }

    pub fn copy_summary(&mut self) {
        let SummaryState::Ready(result) = &self.summary.state else {
            self.set_status_message("No summary to copy");
            return;
        };
        let text = format_status_report(&result.report);
        match self.clipboard.set_text(text) {
            Ok(()) => self.set_status_message("Copied summary to clipboard"),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    #[cfg(test)]
    pub(crate) fn summary_sender(&self) -> UnboundedSender<SummaryMessage> {
        self.summary.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::creation::CreationPolicy;
    use crate::database::Database;
    use crate::models::Icon;
    use crate::summary::StatusReport;

    // 2025-03-04 is a Tuesday
    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn app_with(entries: Vec<Entry>) -> App {
        let db = Database::in_memory().unwrap();
        for entry in &entries {
            db.insert_entry(entry).unwrap();
        }
        let repo = EntryRepository::open(db, CreationPolicy::default()).unwrap();
        let mut app = App::with_clipboard(Config::default(), repo, day(4), Box::new(MemoryClipboard::default()));
        app.tick();
        app
    }

    fn labels(app: &App) -> Vec<String> {
        app.current_entry()
            .map(|entry| entry.tasks.iter().map(|t| t.label.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn opening_creates_todays_entry_with_carried_tasks() {
        let app = app_with(vec![Entry::on_date(
            day(3),
            EntryType::Daily,
            vec![Task::new(Icon::Todo, "A"), Task::new(Icon::Check, "B")],
        )]);
        let entry = app.current_entry().unwrap();
        assert_eq!(entry.date(), day(4));
        assert_eq!(labels(&app), vec!["A", "B"]);
        assert_eq!(app.focused_position(), Some(0));
    }

    #[test]
    fn superseded_navigation_creates_nothing() {
        let mut app = app_with(vec![]);
        let before = app.repository.entries().len();
        app.step_day(1);
        app.step_day(1);
        let pending = app.pending_navigation().unwrap();
        assert_eq!(pending.date, day(6));
        app.tick();
        // only the final target was resolved
        assert_eq!(app.repository.entries().len(), before + 1);
        assert!(app.repository.find_entry(day(5), EntryType::Weekly).is_none());
        assert!(app.repository.find_entry(day(6), EntryType::Daily).is_some());
        assert_eq!(app.timeline.direction, Direction::Forward);
    }

    #[test]
    fn past_dates_stay_empty_by_default() {
        let mut app = app_with(vec![]);
        app.step_day(-2);
        app.tick();
        assert!(app.current_entry().is_none());
        app.begin_editing();
        assert_eq!(app.ui.mode, Mode::View);
        assert!(app.status.message.is_some());
    }

    #[test]
    fn editing_commits_label_and_opens_next_row() {
        let mut app = app_with(vec![]);
        app.begin_editing();
        assert_eq!(app.ui.mode, Mode::Editing);
        for ch in "Ship".chars() {
            app.editor.insert_char(ch);
        }
        app.edit_key(EditKey::Commit);
        assert_eq!(labels(&app), vec!["Ship", ""]);
        assert_eq!(app.focused_position(), Some(1));
        assert!(app.editor.is_empty());

        // backspace on the empty row removes it and returns to the first
        app.backspace();
        assert_eq!(labels(&app), vec!["Ship"]);
        assert_eq!(app.editor.text, "Ship");
        app.end_editing();
        assert_eq!(app.ui.mode, Mode::View);
    }

    #[test]
    fn move_and_indent_persist() {
        let mut app = app_with(vec![Entry::on_date(
            day(4),
            EntryType::Daily,
            vec![Task::new(Icon::Todo, "A"), Task::new(Icon::Todo, "B")],
        )]);
        app.move_task(1);
        assert_eq!(labels(&app), vec!["B", "A"]);
        assert_eq!(app.focused_task().unwrap().label, "A");
        app.shift_indent(1);
        app.shift_indent(-5);
        assert_eq!(app.focused_task().unwrap().indent, 0);
        app.cycle_icon();
        assert_eq!(app.focused_task().unwrap().icon, Icon::Todo.next());
    }

    #[test]
    fn deleting_the_only_task_keeps_a_placeholder() {
        let mut app = app_with(vec![Entry::on_date(day(4), EntryType::Daily, vec![Task::new(Icon::Todo, "A")])]);
        app.delete_task();
        app.tick();
        assert_eq!(labels(&app), vec![""]);
        let placeholder = app.current_entry().unwrap().tasks[0].id;
        assert_eq!(app.focus.current_focus(), Some(placeholder));

        app.begin_editing();
        assert_eq!(app.ui.mode, Mode::Editing);
        assert_eq!(app.current_entry().unwrap().tasks.len(), 1);
        app.delete_forward();
        app.tick();

        let tasks = &app.current_entry().unwrap().tasks;
        assert_eq!(tasks.len(), 1);
        assert_ne!(tasks[0].id, placeholder);
        assert_eq!(app.focus.current_focus(), Some(tasks[0].id));
        assert_eq!(app.ui.mode, Mode::Editing);
        assert_eq!(app.repository.entries_on(day(4)).next().map(|e| e.tasks.len()), Some(1));
    }

    #[test]
    fn switch_entry_cycles_through_the_day() {
        let mut app = app_with(vec![Entry::on_date(day(4), EntryType::Weekly, vec![Task::new(Icon::Check, "W")])]);
        assert_eq!(app.current_entry().unwrap().entry_type, EntryType::Daily);
        app.switch_entry();
        assert_eq!(app.current_entry().unwrap().entry_type, EntryType::Weekly);
        assert_eq!(labels(&app), vec!["W"]);
        app.switch_entry();
        assert_eq!(app.current_entry().unwrap().entry_type, EntryType::Daily);

        app.step_day(1);
        app.tick();
        let shown = app.ui.current_entry;
        app.switch_entry();
        assert_eq!(app.ui.current_entry, shown);
        assert!(app.status.message.as_deref().unwrap().starts_with("Only one entry"));
    }

    #[test]
    fn delete_entry_goes_through_confirmation() {
        let mut app = app_with(vec![]);
        app.request_delete_entry();
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        app.confirm_delete_entry();
        assert!(app.current_entry().is_none());
        assert!(app.repository.find_entry(day(4), EntryType::Daily).is_none());
    }

    #[test]
    fn toggle_refuses_to_duplicate_a_type() {
        let mut app = app_with(vec![Entry::on_date(day(4), EntryType::Weekly, vec![])]);
        // today's daily was created alongside the manual weekly
        app.toggle_entry_type();
        assert_eq!(app.repository.entries_on(day(4)).count(), 2);
        assert!(app.status.message.as_deref().unwrap().contains("already exists"));
    }

    #[test]
    fn stale_summary_results_are_dropped() {
        let mut app = app_with(vec![]);
        let stale = app.summary.tickets.issue();
        let current = app.summary.tickets.issue();
        app.summary.state = SummaryState::Loading(SummaryStage::Decoding);

        let result = |title: &str| SummaryResult {
            report: StatusReport::parse(&format!(r#"{{"projects":[{{"title":"{}","issues":[]}}]}}"#, title)).unwrap(),
            raw: String::new(),
            days: 1,
        };
        let sender = app.summary_sender();
        sender.send(SummaryMessage::Finished(stale, Ok(result("old")))).unwrap();
        app.poll_summary();
        assert!(app.summary.is_loading());

        sender.send(SummaryMessage::Finished(current, Ok(result("new")))).unwrap();
        app.poll_summary();
        match &app.summary.state {
            SummaryState::Ready(result) => assert_eq!(result.report.projects[0].title.as_deref(), Some("new")),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn missing_keys_fail_without_a_request() {
        let mut app = app_with(vec![]);
        app.config.summary.linear_api_key = None;
        app.config.summary.gemini_api_key = None;
        if app.config.linear_api_key().is_some() {
            // key supplied by the environment
            return;
        }
        app.enter_summary_mode();
        assert!(matches!(app.summary.state, SummaryState::Failed(_)));
    }
}
