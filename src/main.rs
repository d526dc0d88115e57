use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing::{error, info};
use weekly::clipboard::{ClipboardSink, SystemClipboard};
use weekly::cli::{self, Cli, Commands};
use weekly::database::StoreError;
use weekly::models::{today, EntryType};
use weekly::{Config, Database, EntryRepository, Profile};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(&weekly::utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let log_dir = weekly::utils::get_data_dir(profile)
        .or_else(|| db_path.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = weekly::logging::init(&log_dir, &config.log_level) {
        eprintln!("Logging disabled: {}", e);
    }
    info!(path = %db_path.display(), "starting");

    let db_path = db_path
        .to_str()
        .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
        .to_string();
    let db = open_database_with_retry(&db_path)?;
    let mut repo = EntryRepository::open(db, config.creation_policy())?;
    let today = today();

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = weekly::tui::App::new(config, repo)?;
            weekly::tui::run_event_loop(app)?;
        }
        Commands::Today => {
            cli::handle_today(&mut repo, today)?;
        }
        Commands::Show { date } => {
            cli::handle_show(&repo, date, today)?;
        }
        Commands::AddDaily { date } => {
            cli::handle_add_entry(&mut repo, date, EntryType::Daily, today)?;
        }
        Commands::AddWeekly { date } => {
            cli::handle_add_entry(&mut repo, date, EntryType::Weekly, today)?;
        }
        Commands::AddTask { label, icon, indent, date } => {
            cli::handle_add_task(&mut repo, label, icon, indent, date, today)?;
        }
        Commands::Copy { date, entry_type, print } => {
            let mut clipboard = SystemClipboard;
            let sink: Option<&mut dyn ClipboardSink> = if print { None } else { Some(&mut clipboard) };
            cli::handle_copy(&repo, date, entry_type, sink, today)?;
        }
        Commands::Timeline { days } => {
            cli::handle_timeline(&repo, &config, days, today);
        }
        Commands::DeleteEntry { date, entry_type } => {
            cli::handle_delete_entry(&mut repo, date, entry_type, today)?;
        }
        Commands::Summary { days, copy } => {
            let mut clipboard = SystemClipboard;
            let sink: Option<&mut dyn ClipboardSink> = if copy { Some(&mut clipboard) } else { None };
            cli::handle_summary(&config, days, sink)?;
        }
    }

    Ok(())
}

/// Open the store, offering a retry on failure
fn open_database_with_retry(path: &str) -> Result<Database, StoreError> {
    loop {
        match Database::new(path) {
            Ok(db) => return Ok(db),
            Err(e) => {
                error!(error = %e, "failed to open database");
                eprintln!("Failed to open database at {}: {}", path, e);
                if !ask_retry() {
                    return Err(e);
                }
            }
        }
    }
}

fn ask_retry() -> bool {
    eprint!("Retry? [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
    }
}
