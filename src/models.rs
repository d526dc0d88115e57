use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;
pub type EntryId = Uuid;

/// Status tag shown in front of a task. Declaration order is the canonical
/// order used when grouping tasks for a weekly entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Aligned,
    Canceled,
    Check,
    Ongoing,
    Paused,
    Progress,
    Todo,
}

impl Icon {
    pub const ALL: [Icon; 7] = [
        Icon::Aligned,
        Icon::Canceled,
        Icon::Check,
        Icon::Ongoing,
        Icon::Paused,
        Icon::Progress,
        Icon::Todo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Icon::Aligned => "aligned",
            Icon::Canceled => "canceled",
            Icon::Check => "check",
            Icon::Ongoing => "ongoing",
            Icon::Paused => "paused",
            Icon::Progress => "progress",
            Icon::Todo => "todo",
        }
    }

    /// Position in the canonical icon order
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Next icon in canonical order, wrapping around
    pub fn next(self) -> Icon {
        Icon::ALL[(self.rank() + 1) % Icon::ALL.len()]
    }

    /// Single-cell glyph used by the terminal UI
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Aligned => "◆",
            Icon::Canceled => "✗",
            Icon::Check => "✓",
            Icon::Ongoing => "↻",
            Icon::Paused => "‖",
            Icon::Progress => "◐",
            Icon::Todo => "○",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Icon {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the slack form (":todo:") as well as the bare name
        let name = s.trim().trim_matches(':').to_lowercase();
        Icon::ALL
            .into_iter()
            .find(|icon| icon.as_str() == name)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Daily,
    Weekly,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Daily => "daily",
            EntryType::Weekly => "weekly",
        }
    }

    pub fn toggled(self) -> EntryType {
        match self {
            EntryType::Daily => EntryType::Weekly,
            EntryType::Weekly => EntryType::Daily,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(EntryType::Daily),
            "weekly" => Ok(EntryType::Weekly),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub icon: Icon,
    pub label: String,
    pub indent: u16,
    pub index: usize,
}

impl Task {
    pub fn new(icon: Icon, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            icon,
            label: label.into(),
            indent: 0,
            index: 0,
        }
    }

    /// Blank `todo` task used as the editing placeholder
    pub fn blank() -> Self {
        Self::new(Icon::Todo, "")
    }

    pub fn with_indent(mut self, indent: u16) -> Self {
        self.indent = indent;
        self
    }

    /// Independent copy with a fresh identity. The index is left for the
    /// caller to renumber.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            icon: self.icon,
            label: self.label.clone(),
            indent: self.indent,
            index: self.index,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.label.trim().is_empty()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            " ".repeat(self.indent as usize),
            self.icon,
            self.label
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub timestamp: NaiveDateTime,
    pub entry_type: EntryType,
    pub tasks: Vec<Task>,
}

impl Entry {
    pub fn new(timestamp: NaiveDateTime, entry_type: EntryType, tasks: Vec<Task>) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4(),
            timestamp,
            entry_type,
            tasks,
        };
        crate::ordering::reindex(&mut entry.tasks);
        entry
    }

    /// Entry dated at the start of `date`
    pub fn on_date(date: NaiveDate, entry_type: EntryType, tasks: Vec<Task>) -> Self {
        Self::new(start_of_day(date), entry_type, tasks)
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.date() == date
    }

    pub fn is_daily(&self) -> bool {
        self.entry_type == EntryType::Daily
    }

    pub fn is_weekly(&self) -> bool {
        self.entry_type == EntryType::Weekly
    }

    /// True when at least one task carries a non-blank label
    pub fn has_tasks(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_blank())
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn position_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Today's date in the local calendar
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
