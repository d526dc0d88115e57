//! File logging. The TUI owns the terminal, so log output goes to
//! `weekly.log` in the data directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "WEEKLY_LOG";
pub const LOG_FILE: &str = "weekly.log";

/// Filter from `WEEKLY_LOG` when set and valid, else the configured level
pub fn build_filter(from_env: Option<&str>, configured: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber writing to `<dir>/weekly.log`. Returns the
/// log path.
pub fn init(dir: &Path, configured_level: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env.as_deref(), configured_level);

    // a second init (tests, repeated calls) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directive_wins_when_valid() {
        assert_eq!(build_filter(Some("debug"), "warn").to_string(), "debug");
        assert_eq!(build_filter(Some("weekly=trace"), "warn").to_string(), "weekly=trace");
    }

    #[test]
    fn falls_back_to_configured_then_info() {
        assert_eq!(build_filter(None, "warn").to_string(), "warn");
        assert_eq!(build_filter(Some("weekly=loud"), "error").to_string(), "error");
        assert_eq!(build_filter(None, "weekly=loud").to_string(), "info");
    }

    #[test]
    fn init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = init(&dir.path().join("logs"), "info").unwrap();
        assert!(path.exists());
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(LOG_FILE));
    }
}
