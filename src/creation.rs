//! Rules for building a new entry's starting task list.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Entry, EntryType, Icon, Task};
use crate::ordering::reindex;

/// Number of calendar days, ending on the target date, a weekly entry
/// collects tasks from
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

/// What navigating to a past date without an entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PastDatePolicy {
    /// Show the day as empty; nothing is written
    ShowEmpty,
    /// Create the entry like any other day
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The user moved to a date that had no entry
    Navigation,
    /// "Add Daily" / "Add Weekly"
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationPolicy {
    pub weekly_day: Weekday,
    pub past_dates: PastDatePolicy,
}

impl Default for CreationPolicy {
    fn default() -> Self {
        Self {
            weekly_day: Weekday::Wed,
            past_dates: PastDatePolicy::ShowEmpty,
        }
    }
}

impl CreationPolicy {
    /// Weekly on the configured day of week, daily otherwise
    pub fn classify_date(&self, date: NaiveDate) -> EntryType {
        if date.weekday() == self.weekly_day {
            EntryType::Weekly
        } else {
            EntryType::Daily
        }
    }

    /// Whether navigation may create an entry on `date`
    pub fn allows_auto_create(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= today || self.past_dates == PastDatePolicy::Create
    }
}

/// Fresh copies of `source`'s tasks for a new daily entry.
///
/// Navigation copies everything; a manual "Add Daily" leaves out finished
/// (`check`) tasks.
pub fn carry_forward_daily(source: Option<&Entry>, trigger: Trigger) -> Vec<Task> {
    let Some(source) = source else {
        return Vec::new();
    };

    let mut tasks: Vec<Task> = source
        .tasks
        .iter()
        .filter(|task| trigger == Trigger::Navigation || task.icon != Icon::Check)
        .map(Task::duplicate)
        .collect();
    reindex(&mut tasks);
    tasks
}

/// Tasks for a weekly entry on `target`: everything with a label from the
/// entries dated in the trailing week, grouped by icon in canonical order.
///
/// A label that shows up in several entries (a task carried across the week)
/// appears once, at its first position, with the icon and indent of its most
/// recent occurrence. Repeats inside one entry are separate tasks and stay
/// separate: the n-th occurrence in an entry only merges with the n-th
/// occurrence in the others.
pub fn aggregate_weekly(entries: &[Entry], target: NaiveDate) -> Vec<Task> {
    let window_start = target - Duration::days(WEEKLY_WINDOW_DAYS - 1);

    let mut in_window: Vec<&Entry> = entries
        .iter()
        .filter(|entry| {
            let date = entry.date();
            date >= window_start && date <= target
        })
        .collect();
    in_window.sort_by_key(|entry| entry.timestamp);

    let mut collected: Vec<Task> = Vec::new();
    let mut slots: HashMap<String, Vec<usize>> = HashMap::new();
    for entry in in_window {
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for task in entry.tasks.iter().filter(|task| !task.is_blank()) {
            let key = task.label.trim();
            let nth = occurrences.entry(key).or_default();
            let label_slots = slots.entry(key.to_string()).or_default();
            match label_slots.get(*nth) {
                Some(&slot) => {
                    collected[slot].icon = task.icon;
                    collected[slot].indent = task.indent;
                }
                None => {
                    label_slots.push(collected.len());
                    collected.push(task.duplicate());
                }
            }
            *nth += 1;
        }
    }

    // stable, so first-seen order survives inside each icon group
    collected.sort_by_key(|task| task.icon.rank());
    reindex(&mut collected);
    collected
}

/// An entry's list must not stay empty in the editor
pub fn ensure_placeholder(tasks: &mut Vec<Task>) {
    if tasks.is_empty() {
        tasks.push(Task::blank());
    }
    reindex(tasks);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn classifies_configured_weekday_as_weekly() {
        let policy = CreationPolicy::default();
        // 2025-01-22 is a Wednesday
        assert_eq!(policy.classify_date(date(2025, 1, 22)), EntryType::Weekly);
        assert_eq!(policy.classify_date(date(2025, 1, 23)), EntryType::Daily);

        let friday = CreationPolicy { weekly_day: Weekday::Fri, ..CreationPolicy::default() };
        assert_eq!(friday.classify_date(date(2025, 1, 24)), EntryType::Weekly);
    }

    #[test]
    fn past_dates_follow_policy() {
        let today = date(2025, 1, 22);
        let policy = CreationPolicy::default();
        assert!(policy.allows_auto_create(today, today));
        assert!(policy.allows_auto_create(date(2025, 1, 23), today));
        assert!(!policy.allows_auto_create(date(2025, 1, 21), today));

        let create = CreationPolicy { past_dates: PastDatePolicy::Create, ..policy };
        assert!(create.allows_auto_create(date(2025, 1, 1), today));
    }

    #[test]
    fn navigation_carry_forward_copies_everything() {
        let source = Entry::on_date(
            date(2025, 1, 20),
            EntryType::Daily,
            vec![Task::new(Icon::Todo, "A"), Task::new(Icon::Check, "B")],
        );
        let copied = carry_forward_daily(Some(&source), Trigger::Navigation);
        assert_eq!(copied.len(), 2);
        assert_eq!((copied[0].icon, copied[0].label.as_str(), copied[0].index), (Icon::Todo, "A", 0));
        assert_eq!((copied[1].icon, copied[1].label.as_str(), copied[1].index), (Icon::Check, "B", 1));
        for (copy, original) in copied.iter().zip(&source.tasks) {
            assert_ne!(copy.id, original.id);
        }
    }

    #[test]
    fn manual_carry_forward_drops_finished_tasks() {
        let source = Entry::on_date(
            date(2025, 1, 20),
            EntryType::Daily,
            vec![Task::new(Icon::Check, "done"), Task::new(Icon::Progress, "half")],
        );
        let copied = carry_forward_daily(Some(&source), Trigger::Manual);
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].label, "half");
        assert_eq!(copied[0].index, 0);
    }

    #[test]
    fn weekly_groups_by_icon_order() {
        let entries = vec![Entry::on_date(
            date(2025, 1, 20),
            EntryType::Daily,
            vec![
                Task::new(Icon::Check, "X"),
                Task::new(Icon::Todo, "Y"),
                Task::new(Icon::Progress, "Z"),
            ],
        )];
        let tasks = aggregate_weekly(&entries, date(2025, 1, 22));
        let labels: Vec<&str> = tasks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["X", "Z", "Y"]);
        assert_eq!(tasks.iter().map(|t| t.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn weekly_skips_blank_and_out_of_window() {
        let entries = vec![
            Entry::on_date(date(2025, 1, 15), EntryType::Daily, vec![Task::new(Icon::Todo, "too old")]),
            Entry::on_date(date(2025, 1, 16), EntryType::Daily, vec![Task::new(Icon::Todo, "kept"), Task::blank()]),
            Entry::on_date(date(2025, 1, 23), EntryType::Daily, vec![Task::new(Icon::Todo, "future")]),
        ];
        let tasks = aggregate_weekly(&entries, date(2025, 1, 22));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].label, "kept");
    }

    #[test]
    fn weekly_collapses_carried_tasks_to_latest_state() {
        let entries = vec![
            Entry::on_date(date(2025, 1, 20), EntryType::Daily, vec![Task::new(Icon::Todo, "Ship it")]),
            Entry::on_date(date(2025, 1, 21), EntryType::Daily, vec![Task::new(Icon::Check, "Ship it ")]),
        ];
        let tasks = aggregate_weekly(&entries, date(2025, 1, 22));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].icon, Icon::Check);
    }

    #[test]
    fn weekly_keeps_same_label_tasks_within_an_entry() {
        let entries = vec![
            Entry::on_date(
                date(2025, 3, 3),
                EntryType::Daily,
                vec![Task::new(Icon::Check, "Review PR"), Task::new(Icon::Todo, "Review PR").with_indent(1)],
            ),
            Entry::on_date(date(2025, 3, 4), EntryType::Daily, vec![Task::new(Icon::Progress, "Review PR")]),
        ];
        let tasks = aggregate_weekly(&entries, date(2025, 3, 5));
        let fields: Vec<(Icon, &str, u16)> = tasks.iter().map(|t| (t.icon, t.label.as_str(), t.indent)).collect();
        // the carried copy on the 4th merges with the first occurrence only
        assert_eq!(
            fields,
            vec![(Icon::Progress, "Review PR", 0), (Icon::Todo, "Review PR", 1)]
        );
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[test]
    fn placeholder_only_added_to_empty_list() {
        let mut empty = Vec::new();
        ensure_placeholder(&mut empty);
        assert_eq!(empty.len(), 1);
        assert_eq!((empty[0].icon, empty[0].label.as_str(), empty[0].index), (Icon::Todo, "", 0));

        let mut one = vec![Task::new(Icon::Check, "x")];
        ensure_placeholder(&mut one);
        assert_eq!(one.len(), 1);
    }
}
