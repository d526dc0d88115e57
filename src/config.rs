use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::creation::{CreationPolicy, PastDatePolicy};
use crate::summary::{SummaryRequest, DEFAULT_MODEL};
use crate::timeline::{DEFAULT_DAYS_AHEAD, DEFAULT_DAYS_BACK};
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

pub const LINEAR_KEY_ENV: &str = "WEEKLY_LINEAR_API_KEY";
pub const GEMINI_KEY_ENV: &str = "WEEKLY_GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_weekly_day")]
    pub weekly_day: Weekday,
    #[serde(default = "default_past_dates")]
    pub past_dates: PastDatePolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_summary_days")]
    pub days: u32,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_previous_day")]
    pub previous_day: String,
    #[serde(default = "default_next_day")]
    pub next_day: String,
    #[serde(default = "default_today")]
    pub today: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_new_task")]
    pub new_task: String,
    #[serde(default = "default_delete_task")]
    pub delete_task: String,
    #[serde(default = "default_cycle_icon")]
    pub cycle_icon: String,
    #[serde(default = "default_indent")]
    pub indent: String,
    #[serde(default = "default_outdent")]
    pub outdent: String,
    #[serde(default = "default_move_up")]
    pub move_up: String,
    #[serde(default = "default_move_down")]
    pub move_down: String,
    #[serde(default = "default_copy")]
    pub copy: String,
    #[serde(default = "default_toggle_type")]
    pub toggle_type: String,
    /// Show the other entry on a day that has both types
    #[serde(default = "default_switch_entry")]
    pub switch_entry: String,
    #[serde(default = "default_delete_entry")]
    pub delete_entry: String,
    #[serde(default = "default_add_daily")]
    pub add_daily: String,
    #[serde(default = "default_add_weekly")]
    pub add_weekly: String,
    #[serde(default = "default_summary_key")]
    pub summary: String,
    #[serde(default = "default_help")]
    pub help: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    /// Marker colour for weekly entries in the date strip
    #[serde(default = "default_weekly_marker")]
    pub weekly_marker: String,
    #[serde(default = "default_muted")]
    pub muted: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            weekly_day: default_weekly_day(),
            past_dates: default_past_dates(),
            log_level: default_log_level(),
            current_theme: default_current_theme(),
            config_version: Some(CURRENT_CONFIG_VERSION),
            timeline: TimelineConfig::default(),
            summary: SummaryConfig::default(),
            key_bindings: KeyBindings::default(),
            themes: HashMap::new(),
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            days_ahead: default_days_ahead(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            temperature: default_temperature(),
            days: default_summary_days(),
            model: default_model(),
            linear_api_key: None,
            gemini_api_key: None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            previous_day: default_previous_day(),
            next_day: default_next_day(),
            today: default_today(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            edit: default_edit(),
            new_task: default_new_task(),
            delete_task: default_delete_task(),
            cycle_icon: default_cycle_icon(),
            indent: default_indent(),
            outdent: default_outdent(),
            move_up: default_move_up(),
            move_down: default_move_down(),
            copy: default_copy(),
            toggle_type: default_toggle_type(),
            switch_entry: default_switch_entry(),
            delete_entry: default_delete_entry(),
            add_daily: default_add_daily(),
            add_weekly: default_add_weekly(),
            summary: default_summary_key(),
            help: default_help(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            weekly_marker: default_weekly_marker(),
            muted: default_muted(),
        }
    }
}

impl Theme {
    fn preset(fg: &str, bg: &str, highlight_bg: &str, highlight_fg: &str, weekly_marker: &str) -> Theme {
        Theme {
            fg: fg.to_string(),
            bg: bg.to_string(),
            highlight_bg: highlight_bg.to_string(),
            highlight_fg: highlight_fg.to_string(),
            weekly_marker: weekly_marker.to_string(),
            muted: default_muted(),
        }
    }

    /// Preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();
        themes.insert("default".to_string(), Theme::default());
        themes.insert("dark".to_string(), Theme::preset("white", "black", "cyan", "black", "red"));
        themes.insert("light".to_string(), Theme::preset("black", "white", "blue", "white", "red"));
        themes.insert("monochrome".to_string(), Theme::preset("white", "black", "white", "black", "white"));
        themes
    }
}

// Default value functions
fn default_database_path() -> String {
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("weekly.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/weekly/weekly.db".to_string()
    }
}

fn default_weekly_day() -> Weekday {
    Weekday::Wed
}

fn default_past_dates() -> PastDatePolicy {
    PastDatePolicy::ShowEmpty
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_days_back() -> u32 {
    DEFAULT_DAYS_BACK
}

fn default_days_ahead() -> u32 {
    DEFAULT_DAYS_AHEAD
}

fn default_prompt() -> String {
    "You are a software engineer who is reporting the status of the projects you're working on from your issues in Linear.
Please summarize the status of the attached linear output in a bulleted list. Focus on the progress made today.

When you organize and summarize these issues:
* Use professional tone but be concise
* Use the provided issue summaries to create a cohesive overview
* Make the issue label a title text that's wrapped in a markdown link
* Provide more information for issues that are in progress
* Provide less information for issues that are finished
* The summary is where you can add a personal note or mention roadblocks. It is optional, leave it empty if there is nothing to note.
"
    .to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_summary_days() -> u32 {
    1
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_previous_day() -> String {
    "h".to_string()
}

fn default_next_day() -> String {
    "l".to_string()
}

fn default_today() -> String {
    "g".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_new_task() -> String {
    "n".to_string()
}

fn default_delete_task() -> String {
    "d".to_string()
}

fn default_cycle_icon() -> String {
    "Space".to_string()
}

fn default_indent() -> String {
    "Tab".to_string()
}

fn default_outdent() -> String {
    "BackTab".to_string()
}

fn default_move_up() -> String {
    "Ctrl+Up".to_string()
}

fn default_move_down() -> String {
    "Ctrl+Down".to_string()
}

fn default_copy() -> String {
    "y".to_string()
}

fn default_toggle_type() -> String {
    "t".to_string()
}

fn default_switch_entry() -> String {
    "c".to_string()
}

fn default_delete_entry() -> String {
    "D".to_string()
}

fn default_add_daily() -> String {
    "a".to_string()
}

fn default_add_weekly() -> String {
    "w".to_string()
}

fn default_summary_key() -> String {
    "s".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_weekly_marker() -> String {
    "red".to_string()
}

fn default_muted() -> String {
    "darkgray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from the profile's config dir, or create the
    /// default file if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let mut config = Self::load_or_create_with(&config_path, profile)?;
        if config.database_path.trim().is_empty() {
            config.database_path = Self::default_database_path_for_profile(profile);
        }
        Ok(config)
    }

    /// Load from an explicit file (`--config`), creating it with defaults
    /// for `profile` when it does not exist
    pub fn load_from_path(path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        let mut config = Self::load_or_create_with(path, profile)?;
        if config.database_path.trim().is_empty() {
            config.database_path = Self::default_database_path_for_profile(profile);
        }
        Ok(config)
    }

    fn load_or_create_with(path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents =
                fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
            Self::from_toml(&contents)
        } else {
            let mut config = Config {
                database_path: Self::default_database_path_for_profile(profile),
                ..Config::default()
            };
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Parse a config file body; missing keys fall back to defaults
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("weekly.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/weekly-dev/weekly.db".to_string(),
                utils::Profile::Prod => "~/.local/share/weekly/weekly.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn creation_policy(&self) -> CreationPolicy {
        CreationPolicy {
            weekly_day: self.weekly_day,
            past_dates: self.past_dates,
        }
    }

    pub fn summary_request(&self) -> SummaryRequest {
        SummaryRequest {
            prompt: self.summary.prompt.clone(),
            temperature: self.summary.temperature.clamp(0.0, 2.0),
            days: self.summary.days.max(1),
        }
    }

    /// Linear key, preferring the environment over the file
    pub fn linear_api_key(&self) -> Option<String> {
        resolve_api_key(
            std::env::var(LINEAR_KEY_ENV).ok(),
            self.summary.linear_api_key.as_deref(),
        )
    }

    pub fn gemini_api_key(&self) -> Option<String> {
        resolve_api_key(
            std::env::var(GEMINI_KEY_ENV).ok(),
            self.summary.gemini_api_key.as_deref(),
        )
    }

    /// Get the currently active theme
    /// If highlight_fg is not set (empty string), it is calculated from highlight_bg
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = if let Some(theme) = self.themes.get(&self.current_theme) {
            theme.clone()
        } else if let Some(theme) = Theme::get_preset_themes().get(&self.current_theme) {
            theme.clone()
        } else {
            Theme::default()
        };

        if theme.highlight_fg.is_empty() {
            let highlight_bg_color = parse_color(&theme.highlight_bg);
            let calculated_fg = get_contrast_text_color(highlight_bg_color);
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }
}

fn resolve_api_key(from_env: Option<String>, from_file: Option<&str>) -> Option<String> {
    from_env
        .filter(|key| !key.trim().is_empty())
        .or_else(|| from_file.filter(|key| !key.trim().is_empty()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml(
            "weekly_day = \"Fri\"\npast_dates = \"create\"\n\n[summary]\ndays = 3\n",
        )
        .unwrap();
        assert_eq!(config.weekly_day, Weekday::Fri);
        assert_eq!(config.past_dates, PastDatePolicy::Create);
        assert_eq!(config.summary.days, 3);
        assert_eq!(config.summary.model, DEFAULT_MODEL);
        assert_eq!(config.timeline.days_back, 60);
        assert_eq!(config.key_bindings.quit, "q");
    }

    #[test]
    fn empty_file_gives_wednesday_and_show_empty() {
        let config = Config::from_toml("").unwrap();
        let policy = config.creation_policy();
        assert_eq!(policy.weekly_day, Weekday::Wed);
        assert_eq!(policy.past_dates, PastDatePolicy::ShowEmpty);
    }

    #[test]
    fn invalid_past_dates_value_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml("past_dates = \"sometimes\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn saved_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.weekly_day = Weekday::Mon;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(loaded.weekly_day, Weekday::Mon);
        assert_eq!(loaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn environment_key_wins_over_file() {
        assert_eq!(resolve_api_key(Some("env".into()), Some("file")), Some("env".into()));
        assert_eq!(resolve_api_key(Some("  ".into()), Some("file")), Some("file".into()));
        assert_eq!(resolve_api_key(None, Some("")), None);
    }

    #[test]
    fn summary_request_clamps_values() {
        let mut config = Config::default();
        config.summary.days = 0;
        config.summary.temperature = 5.0;
        let request = config.summary_request();
        assert_eq!(request.days, 1);
        assert_eq!(request.temperature, 2.0);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let mut config = Config::default();
        config.current_theme = "monochrome".to_string();
        let presets = Theme::get_preset_themes();
        assert_eq!(config.get_active_theme().bg, presets["monochrome"].bg);

        config.current_theme = "neon".to_string();
        let active = config.get_active_theme();
        assert_eq!(active.fg, Theme::default().fg);
        assert!(!active.highlight_fg.is_empty());
    }
}
