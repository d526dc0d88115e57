use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::clipboard::{ClipboardError, ClipboardSink};
use crate::config::Config;
use crate::export::{format_entry_as_plain_text, format_status_report};
use crate::models::{Entry, EntryId, EntryType, Icon, Task};
use crate::repository::{EntryRepository, RepositoryError};
use crate::summary::{self, GeminiClient, LinearClient, SummaryError};
use crate::timeline::{bucketize, date_window, DayBucket};
use crate::utils::parse_date;

#[derive(Parser)]
#[command(name = "weekly")]
#[command(about = "Daily and weekly status updates from the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Print today's entry, creating it if needed
    Today,
    /// Print the entries of a date
    Show {
        /// Date (YYYY-MM-DD, today, yesterday, tomorrow)
        date: Option<String>,
    },
    /// Add a daily entry, carrying over unfinished tasks
    AddDaily {
        date: Option<String>,
    },
    /// Add a weekly entry built from the past week
    AddWeekly {
        date: Option<String>,
    },
    /// Append a task to a date's entry
    AddTask {
        /// Task label
        label: String,
        /// Icon (aligned, canceled, check, ongoing, paused, progress, todo)
        #[arg(long, default_value = "todo")]
        icon: Icon,
        /// Indent level
        #[arg(long, default_value_t = 0)]
        indent: u16,
        /// Date of the entry (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Copy an entry as Slack text
    Copy {
        date: Option<String>,
        /// Entry type when the date has both
        #[arg(long = "type")]
        entry_type: Option<EntryType>,
        /// Print instead of copying to the clipboard
        #[arg(long)]
        print: bool,
    },
    /// List recent days and their entries
    Timeline {
        /// Days to look back (defaults to the configured window)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Delete an entry and its tasks
    DeleteEntry {
        date: String,
        #[arg(long = "type")]
        entry_type: EntryType,
    },
    /// Summarize recent Linear issues with Gemini
    Summary {
        /// Days of issue history (defaults to the configured value)
        #[arg(long)]
        days: Option<u32>,
        /// Copy the report to the clipboard as well
        #[arg(long)]
        copy: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("No {entry_type} entry on {date}")]
    EntryNotFound { date: NaiveDate, entry_type: String },
    #[error(transparent)]
    ClipboardError(#[from] ClipboardError),
    #[error("Summary failed: {0}")]
    SummaryError(#[from] SummaryError),
    #[error("Failed to start async runtime: {0}")]
    RuntimeError(#[from] std::io::Error),
}

/// Parse a date argument; `None` means today
pub fn resolve_date(arg: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CliError> {
    match arg.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("yesterday") => Ok(today - Duration::days(1)),
        Some("tomorrow") => Ok(today + Duration::days(1)),
        Some(raw) => parse_date(raw)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", raw, e))),
    }
}

/// Header line plus the entry's tasks
pub fn render_entry(entry: &Entry) -> String {
    let mut out = format!(
        "{} ({})\n",
        entry.date().format("%a %Y-%m-%d"),
        entry.entry_type
    );
    for task in &entry.tasks {
        out.push_str(&format!(
            "{}{} {}\n",
            "  ".repeat(task.indent as usize),
            task.icon.glyph(),
            task.label
        ));
    }
    out
}

/// One line per day, newest first: date then a marker per entry with tasks
pub fn render_timeline(buckets: &[DayBucket]) -> String {
    let mut out = String::new();
    for bucket in buckets.iter().rev() {
        let markers: String = bucket
            .markers()
            .map(|weekly| if weekly { 'W' } else { '•' })
            .collect();
        out.push_str(&format!("{}  {}\n", bucket.date.format("%a %m-%d"), markers));
    }
    out
}

/// Handle the today command
pub fn handle_today(repo: &mut EntryRepository, today: NaiveDate) -> Result<Option<EntryId>, CliError> {
    let id = repo.ensure_entry_for_date(today, today)?;
    match id.and_then(|id| repo.entry(id)) {
        Some(entry) => print!("{}", render_entry(entry)),
        None => println!("No entry for {}", today),
    }
    Ok(id)
}

/// Handle the show command
pub fn handle_show(repo: &EntryRepository, date: Option<String>, today: NaiveDate) -> Result<(), CliError> {
    let date = resolve_date(date.as_deref(), today)?;
    let mut found = false;
    for entry in repo.entries_on(date) {
        print!("{}", render_entry(entry));
        found = true;
    }
    if !found {
        println!("No entries on {}", date);
    }
    Ok(())
}

/// Handle add-daily / add-weekly
pub fn handle_add_entry(
    repo: &mut EntryRepository,
    date: Option<String>,
    entry_type: EntryType,
    today: NaiveDate,
) -> Result<EntryId, CliError> {
    let date = resolve_date(date.as_deref(), today)?;
    let id = repo.add_manual_entry(date, entry_type)?;
    if let Some(entry) = repo.entry(id) {
        println!("{} entry for {} ({} tasks)", entry_type, date, entry.tasks.len());
    }
    Ok(id)
}

/// Handle the add-task command. A lone blank placeholder is filled in
/// instead of getting a sibling.
pub fn handle_add_task(
    repo: &mut EntryRepository,
    label: String,
    icon: Icon,
    indent: u16,
    date: Option<String>,
    today: NaiveDate,
) -> Result<EntryId, CliError> {
    let date = resolve_date(date.as_deref(), today)?;
    let entry_type = repo.policy().classify_date(date);
    let id = match repo.find_entry(date, entry_type) {
        Some(entry) => entry.id,
        None => repo.add_manual_entry(date, entry_type)?,
    };

    let (placeholder, last) = match repo.entry(id) {
        Some(entry) => (
            (entry.tasks.len() == 1 && entry.tasks[0].is_blank()).then(|| entry.tasks[0].id),
            entry.tasks.last().map(|task| task.id),
        ),
        None => (None, None),
    };

    match placeholder {
        Some(task_id) => {
            repo.set_task_label(id, task_id, &label)?;
            repo.set_task_icon(id, task_id, icon)?;
            repo.set_task_indent(id, task_id, i32::from(indent))?;
        }
        None => {
            let task = Task::new(icon, label.clone()).with_indent(indent);
            repo.insert_task_after(id, last, task)?;
        }
    }
    println!("Added :{}: {} to {} entry for {}", icon, label, entry_type, date);
    Ok(id)
}

/// Pick the entry a date-based command refers to: the requested type, else
/// the one matching the day's classification, else whatever is there
fn pick_entry<'a>(
    repo: &'a EntryRepository,
    date: NaiveDate,
    entry_type: Option<EntryType>,
) -> Result<&'a Entry, CliError> {
    let found = match entry_type {
        Some(entry_type) => repo.find_entry(date, entry_type),
        None => repo
            .find_entry(date, repo.policy().classify_date(date))
            .or_else(|| repo.entries_on(date).next()),
    };
    found.ok_or_else(|| CliError::EntryNotFound {
        date,
        entry_type: entry_type.map_or("matching".to_string(), |t| t.to_string()),
    })
}

/// Handle the copy command
pub fn handle_copy(
    repo: &EntryRepository,
    date: Option<String>,
    entry_type: Option<EntryType>,
    clipboard: Option<&mut dyn ClipboardSink>,
    today: NaiveDate,
) -> Result<String, CliError> {
    let date = resolve_date(date.as_deref(), today)?;
    let text = format_entry_as_plain_text(pick_entry(repo, date, entry_type)?);
    match clipboard {
        Some(clipboard) => {
            clipboard
                .set_text(text.clone())?;
            println!("Copied {} lines to clipboard", text.lines().count());
        }
        None => println!("{}", text),
    }
    Ok(text)
}

/// Handle the timeline command
pub fn handle_timeline(repo: &EntryRepository, config: &Config, days: Option<u32>, today: NaiveDate) {
    let window = date_window(
        today,
        days.unwrap_or(config.timeline.days_back),
        config.timeline.days_ahead,
    );
    print!("{}", render_timeline(&bucketize(repo.entries(), &window)));
}

/// Handle the delete-entry command
pub fn handle_delete_entry(
    repo: &mut EntryRepository,
    date: String,
    entry_type: EntryType,
    today: NaiveDate,
) -> Result<(), CliError> {
    let date = resolve_date(Some(&date), today)?;
    let id = pick_entry(repo, date, Some(entry_type))?.id;
    let removed = repo.delete_entry(id)?;
    println!("Deleted {} entry for {} ({} tasks)", entry_type, date, removed.tasks.len());
    Ok(())
}

/// Handle the summary command
pub fn handle_summary(
    config: &Config,
    days: Option<u32>,
    clipboard: Option<&mut dyn ClipboardSink>,
) -> Result<String, CliError> {
    let linear = LinearClient::new(config.linear_api_key().unwrap_or_default())?;
    let gemini = GeminiClient::new(
        config.gemini_api_key().unwrap_or_default(),
        config.summary.model.clone(),
    )?;
    let mut request = config.summary_request();
    if let Some(days) = days {
        request.days = days.max(1);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(summary::summarize_status(&linear, &gemini, &request, |stage| {
        eprintln!("{}", stage);
    }))?;

    let text = format_status_report(&result.report);
    println!("{}", text);
    if let Some(clipboard) = clipboard {
        clipboard
            .set_text(text.clone())?;
        eprintln!("Copied to clipboard");
    }
    Ok(text)
}
