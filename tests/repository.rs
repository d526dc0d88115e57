use chrono::{Duration, NaiveDate, Weekday};
use weekly::creation::{CreationPolicy, PastDatePolicy};
use weekly::database::Database;
use weekly::editing::{EditKey, EditOutcome, FocusController};
use weekly::export::format_entry_as_plain_text;
use weekly::models::{Entry, EntryType, Icon, Task};
use weekly::ordering::is_dense;
use weekly::timeline::{bucketize, date_window};
use weekly::EntryRepository;

// 2025-03-05 is a Wednesday
fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn open(path: &std::path::Path, policy: CreationPolicy) -> EntryRepository {
    let db = Database::new(path.to_str().unwrap()).unwrap();
    EntryRepository::open(db, policy).unwrap()
}

#[test]
fn entries_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekly.db");

    let (entry_id, task_id) = {
        let mut repo = open(&path, CreationPolicy::default());
        let id = repo
            .create_entry(date(4), EntryType::Daily, vec![Task::new(Icon::Progress, "Ship feature")])
            .unwrap()
            .id;
        let task = Task::new(Icon::Todo, "Write notes");
        let task_id = task.id;
        repo.insert_task_after(id, None, task).unwrap();
        repo.set_task_indent(id, task_id, 2).unwrap();
        (id, task_id)
    };

    let repo = open(&path, CreationPolicy::default());
    let entry = repo.entry(entry_id).unwrap();
    assert_eq!(entry.tasks.len(), 2);
    assert_eq!(entry.tasks[1].id, task_id);
    assert_eq!(entry.tasks[1].indent, 2);
    assert_eq!(entry.tasks[0].icon, Icon::Progress);
    assert!(is_dense(&entry.tasks));
}

#[test]
fn deleting_an_entry_removes_its_tasks_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekly.db");
    {
        let mut repo = open(&path, CreationPolicy::default());
        let id = repo
            .create_entry(date(4), EntryType::Daily, vec![Task::new(Icon::Todo, "A")])
            .unwrap()
            .id;
        repo.delete_entry(id).unwrap();
    }
    let db = Database::new(path.to_str().unwrap()).unwrap();
    assert_eq!(db.task_count().unwrap(), 0);
    assert!(db.load_entries().unwrap().is_empty());
}

#[test]
fn find_entry_is_unique_per_day_and_type() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open(&dir.path().join("weekly.db"), CreationPolicy::default());

    let first = repo.create_entry(date(4), EntryType::Daily, vec![]).unwrap().id;
    let again = repo.create_entry(date(4), EntryType::Daily, vec![]).unwrap().id;
    assert_eq!(first, again);
    assert_eq!(repo.entries_on(date(4)).count(), 1);

    repo.create_entry(date(4), EntryType::Weekly, vec![]).unwrap();
    assert_eq!(repo.find_entry(date(4), EntryType::Daily).map(|e| e.id), Some(first));
    assert!(repo.find_entry(date(3), EntryType::Daily).is_none());
}

#[test]
fn first_daily_gets_a_single_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open(&dir.path().join("weekly.db"), CreationPolicy::default());
    let id = repo.ensure_entry_for_date(date(4), date(4)).unwrap().unwrap();

    let entry = repo.entry(id).unwrap();
    assert_eq!(entry.entry_type, EntryType::Daily);
    assert_eq!(entry.tasks.len(), 1);
    assert_eq!(entry.tasks[0].icon, Icon::Todo);
    assert_eq!(entry.tasks[0].label, "");
    assert_eq!(entry.tasks[0].index, 0);
}

#[test]
fn navigation_carries_yesterdays_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open(&dir.path().join("weekly.db"), CreationPolicy::default());
    let source = repo
        .create_entry(
            date(3),
            EntryType::Daily,
            vec![Task::new(Icon::Todo, "A"), Task::new(Icon::Check, "B")],
        )
        .unwrap()
        .clone();

    let id = repo.ensure_entry_for_date(date(4), date(4)).unwrap().unwrap();
    let entry = repo.entry(id).unwrap();
    let summary: Vec<(Icon, &str, usize)> = entry
        .tasks
        .iter()
        .map(|t| (t.icon, t.label.as_str(), t.index))
        .collect();
    assert_eq!(summary, vec![(Icon::Todo, "A", 0), (Icon::Check, "B", 1)]);
    for (copy, original) in entry.tasks.iter().zip(&source.tasks) {
        assert_ne!(copy.id, original.id);
    }
}

#[test]
fn manual_add_daily_drops_finished_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open(&dir.path().join("weekly.db"), CreationPolicy::default());
    repo.create_entry(
        date(3),
        EntryType::Daily,
        vec![Task::new(Icon::Todo, "A"), Task::new(Icon::Check, "B")],
    )
    .unwrap();

    let id = repo.add_manual_entry(date(6), EntryType::Daily).unwrap();
    let labels: Vec<&str> = repo.entry(id).unwrap().tasks.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["A"]);
}

#[test]
fn weekly_day_groups_the_week_by_icon() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = open(&dir.path().join("weekly.db"), CreationPolicy::default());
    repo.create_entry(
        date(3),
        EntryType::Daily,
        vec![
            Task::new(Icon::Check, "X"),
            Task::new(Icon::Todo, "Y"),
            Task::new(Icon::Progress, "Z"),
            Task::blank(),
        ],
    )
    .unwrap();

    let id = repo.ensure_entry_for_date(date(5), date(5)).unwrap().unwrap();
    let entry = repo.entry(id).unwrap();
    assert_eq!(entry.entry_type, EntryType::Weekly);
    let labels: Vec<&str> = entry.tasks.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["X", "Z", "Y"]);
}

#[test]
fn past_date_policy_controls_creation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekly.db");

    let mut repo = open(&path, CreationPolicy::default());
    assert_eq!(repo.ensure_entry_for_date(date(3), date(10)).unwrap(), None);
    assert!(repo.entries().is_empty());
    drop(repo);

    let policy = CreationPolicy {
        weekly_day: Weekday::Fri,
        past_dates: PastDatePolicy::Create,
    };
    let mut repo = open(&path, policy);
    let id = repo.ensure_entry_for_date(date(7), date(10)).unwrap().unwrap();
    assert_eq!(repo.entry(id).unwrap().entry_type, EntryType::Weekly);
}

#[test]
fn editing_keys_write_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekly.db");
    let mut repo = open(&path, CreationPolicy::default());
    let id = repo.ensure_entry_for_date(date(4), date(4)).unwrap().unwrap();
    let first = repo.entry(id).unwrap().tasks[0].id;

    let mut focus = FocusController::new();
    focus.request_focus(first);
    let revision = repo.revision();
    let outcome = repo.apply_edit(id, &mut focus, first, EditKey::Commit).unwrap();
    let EditOutcome::Inserted(second) = outcome else {
        panic!("expected an insert, got {:?}", outcome);
    };
    assert_eq!(focus.current_focus(), Some(second));
    assert!(repo.revision() > revision);

    // focus moves are not persisted
    let revision = repo.revision();
    repo.apply_edit(id, &mut focus, second, EditKey::FocusUp).unwrap();
    assert_eq!(repo.revision(), revision);
    drop(repo);

    let repo = open(&path, CreationPolicy::default());
    assert_eq!(repo.entry(id).unwrap().tasks.len(), 2);
}

#[test]
fn late_evening_entries_bucket_on_their_day() {
    let late = date(5).and_hms_opt(23, 59, 0).unwrap();
    let entry = Entry::new(late, EntryType::Daily, vec![Task::new(Icon::Todo, "late")]);
    let window = date_window(date(6), 3, 1);
    let buckets = bucketize(std::slice::from_ref(&entry), &window);

    let bucket = buckets.iter().find(|b| b.date == date(5)).unwrap();
    assert_eq!(bucket.entries.len(), 1);
    assert!(bucket.has_tasks());
    assert!(buckets.iter().filter(|b| b.date != date(5)).all(|b| b.is_empty()));
    assert_eq!(window.first().copied(), Some(date(6) - Duration::days(3)));
}

#[test]
fn exported_daily_starts_with_the_header() {
    let entry = Entry::on_date(
        date(4),
        EntryType::Daily,
        vec![Task::new(Icon::Todo, "Ship feature"), Task::new(Icon::Check, "Review").with_indent(1)],
    );
    assert_eq!(
        format_entry_as_plain_text(&entry),
        "*EOD Update*\n:todo: Ship feature\n :check: Review"
    );
}
