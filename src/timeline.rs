//! Date window and per-day grouping for the navigation strip.

use chrono::{Duration, NaiveDate};

use crate::models::{Entry, EntryId, EntryType};

pub const DEFAULT_DAYS_BACK: u32 = 60;
pub const DEFAULT_DAYS_AHEAD: u32 = 3;

/// Consecutive dates from `days_back` days before `today` up to, but not
/// including, `days_ahead` days after it
pub fn date_window(today: NaiveDate, days_back: u32, days_ahead: u32) -> Vec<NaiveDate> {
    let start = -i64::from(days_back);
    let end = i64::from(days_ahead);
    (start..end).map(|offset| today + Duration::days(offset)).collect()
}

/// Summary of one entry as the timeline needs it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketEntry {
    pub id: EntryId,
    pub entry_type: EntryType,
    pub has_tasks: bool,
}

impl BucketEntry {
    pub fn is_weekly(&self) -> bool {
        self.entry_type == EntryType::Weekly
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub entries: Vec<BucketEntry>,
}

impl DayBucket {
    /// Whether the tile gets a marker at all
    pub fn has_tasks(&self) -> bool {
        self.entries.iter().any(|entry| entry.has_tasks)
    }

    /// One marker per entry with tasks, flagged when the entry is weekly
    pub fn markers(&self) -> impl Iterator<Item = bool> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.has_tasks)
            .map(BucketEntry::is_weekly)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Group `entries` by calendar day for each date of `window`. Time of day is
/// ignored; entries outside the window are left out.
pub fn bucketize(entries: &[Entry], window: &[NaiveDate]) -> Vec<DayBucket> {
    window
        .iter()
        .map(|&date| DayBucket {
            date,
            entries: entries
                .iter()
                .filter(|entry| entry.is_on(date))
                .map(|entry| BucketEntry {
                    id: entry.id,
                    entry_type: entry.entry_type,
                    has_tasks: entry.has_tasks(),
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    None,
}

/// Selected date plus the one before it, for transition direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineCursor {
    selected: NaiveDate,
    previous: Option<NaiveDate>,
}

impl TimelineCursor {
    pub fn new(selected: NaiveDate) -> Self {
        Self {
            selected,
            previous: None,
        }
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn previous(&self) -> Option<NaiveDate> {
        self.previous
    }

    pub fn select(&mut self, date: NaiveDate) -> Direction {
        self.previous = Some(self.selected);
        self.selected = date;
        self.direction()
    }

    /// Move by `days`, staying inside `window` when it is non-empty
    pub fn step(&mut self, days: i64, window: &[NaiveDate]) -> Direction {
        let mut target = self.selected + Duration::days(days);
        if let (Some(&first), Some(&last)) = (window.first(), window.last()) {
            target = target.clamp(first, last);
        }
        self.select(target)
    }

    pub fn direction(&self) -> Direction {
        match self.previous {
            Some(previous) if self.selected > previous => Direction::Forward,
            Some(previous) if self.selected < previous => Direction::Backward,
            _ => Direction::None,
        }
    }
}
