//! Configuration loading, validation and default file generation.
//!
//! The configuration lives in `together.toml` under the user's config
//! directory (`$XDG_CONFIG_HOME/together/together.toml`). A commented default
//! file is written on first run.
//!
//! ```toml
//! anchor_date = "2025-11-25"       # The day it all started
//! timezone = "Asia/Shanghai"       # Zone the day/night boundaries follow
//! day_start = "06:30"              # Day theme from this time
//! night_start = "18:30"            # Night theme from this time
//! clock_interval = 1               # Seconds between live clock refreshes
//! countdown_interval = 60          # Seconds between countdown refreshes
//! theme_interval = 30              # Seconds between theme checks
//! movies_path = "data/movies.json" # Movie gallery data
//!
//! [[countdowns]]
//! name = "Her birthday"
//! month = 3
//! day = 14
//!
//! [[lists]]
//! name = "dates"
//! json_path = "data/dates.json"
//! primary_meta = "location"
//! detail_key = "story"
//! ```
//!
//! Relative data paths are resolved against the directory of the config
//! file that was loaded.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::date_math::RecurringTarget;
use crate::logger::Log;
use crate::records::RecordsView;
use crate::theme::ThemeSchedule;
use crate::ticker::TickerIntervals;

/// A named annual countdown from the config file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CountdownConfig {
    pub name: String,
    pub month: u32,
    pub day: u32,
}

/// Configuration for the together dashboard.
///
/// Scalar fields are optional in the file and filled with defaults on load.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    /// Relationship start date, `YYYY-MM-DD`.
    pub anchor_date: Option<String>,
    /// IANA zone the day/night boundaries are evaluated in.
    pub timezone: Option<String>,
    pub day_start: Option<String>,   // HH:MM or HH:MM:SS
    pub night_start: Option<String>, // HH:MM or HH:MM:SS
    pub clock_interval: Option<u64>,     // seconds
    pub countdown_interval: Option<u64>, // seconds
    pub theme_interval: Option<u64>,     // seconds
    pub movies_path: Option<String>,
    #[serde(default)]
    pub countdowns: Vec<CountdownConfig>,
    #[serde(default)]
    pub lists: Vec<RecordsView>,

    /// Directory relative data paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("together").join("together.toml"))
    }

    /// Write a commented default configuration to `path`.
    pub fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_content = ConfigBuilder::new()
            .add_section("Together configuration")
            .add_setting(
                "anchor_date",
                &format!("\"{}\"", DEFAULT_ANCHOR_DATE),
                "The day it all started (YYYY-MM-DD)",
            )
            .add_section("Day/night theme")
            .add_setting(
                "timezone",
                &format!("\"{}\"", DEFAULT_TIMEZONE),
                "Time zone the theme boundaries follow",
            )
            .add_setting(
                "day_start",
                &format!("\"{}\"", DEFAULT_DAY_START),
                "Day theme begins (HH:MM)",
            )
            .add_setting(
                "night_start",
                &format!("\"{}\"", DEFAULT_NIGHT_START),
                "Night theme begins (HH:MM)",
            )
            .add_section("Refresh intervals")
            .add_setting(
                "clock_interval",
                &DEFAULT_CLOCK_INTERVAL.to_string(),
                &format!(
                    "Live clock refresh in seconds ({}-{})",
                    MINIMUM_INTERVAL, MAXIMUM_INTERVAL
                ),
            )
            .add_setting(
                "countdown_interval",
                &DEFAULT_COUNTDOWN_INTERVAL.to_string(),
                &format!(
                    "Countdown refresh in seconds ({}-{})",
                    MINIMUM_INTERVAL, MAXIMUM_INTERVAL
                ),
            )
            .add_setting(
                "theme_interval",
                &DEFAULT_THEME_INTERVAL.to_string(),
                &format!(
                    "Theme check in seconds ({}-{})",
                    MINIMUM_INTERVAL, MAXIMUM_INTERVAL
                ),
            )
            .add_section("Data files")
            .add_setting(
                "movies_path",
                &format!("\"{}\"", DEFAULT_MOVIES_PATH),
                "Movie gallery JSON array, relative to this file",
            )
            .build();

        fs::write(path, config_content).context("Failed to write default config file")?;
        Ok(())
    }

    /// Load the user's configuration, creating a default file if none exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)
                .context("Failed to create default config during load")?;
            Log::log_indented(&format!(
                "Created default configuration at {}",
                config_path.display()
            ));
        }

        Self::load_from_path(&config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                config_path.display()
            )
        })
    }

    /// Load a specific file. Does not create anything if it is missing.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file not found at specified path: {}",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.base_dir = path.parent().map(Path::to_path_buf);
        Self::apply_defaults(&mut config);
        validate_config(&config)?;

        Ok(config)
    }

    fn apply_defaults(config: &mut Config) {
        config.anchor_date.get_or_insert_with(|| DEFAULT_ANCHOR_DATE.to_string());
        config.timezone.get_or_insert_with(|| DEFAULT_TIMEZONE.to_string());
        config.day_start.get_or_insert_with(|| DEFAULT_DAY_START.to_string());
        config.night_start.get_or_insert_with(|| DEFAULT_NIGHT_START.to_string());
        config.clock_interval.get_or_insert(DEFAULT_CLOCK_INTERVAL);
        config.countdown_interval.get_or_insert(DEFAULT_COUNTDOWN_INTERVAL);
        config.theme_interval.get_or_insert(DEFAULT_THEME_INTERVAL);
        config.movies_path.get_or_insert_with(|| DEFAULT_MOVIES_PATH.to_string());
    }

    pub fn anchor(&self) -> Result<NaiveDate> {
        let raw = self.anchor_date.as_deref().unwrap_or(DEFAULT_ANCHOR_DATE);
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid anchor_date '{}'. Use YYYY-MM-DD format", raw))
    }

    pub fn timezone(&self) -> Result<Tz> {
        let raw = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        raw.parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{}': {}", raw, e))
    }

    pub fn theme_schedule(&self) -> Result<ThemeSchedule> {
        let day_start = parse_time_of_day(
            self.day_start.as_deref().unwrap_or(DEFAULT_DAY_START),
            "day_start",
        )?;
        let night_start = parse_time_of_day(
            self.night_start.as_deref().unwrap_or(DEFAULT_NIGHT_START),
            "night_start",
        )?;
        ThemeSchedule::new(self.timezone()?, day_start, night_start)
    }

    /// Configured countdowns, validated, in file order.
    pub fn recurring_targets(&self) -> Result<Vec<(String, RecurringTarget)>> {
        self.countdowns
            .iter()
            .map(|countdown| {
                RecurringTarget::new(countdown.month, countdown.day)
                    .map(|target| (countdown.name.clone(), target))
                    .with_context(|| format!("Invalid date for countdown '{}'", countdown.name))
            })
            .collect()
    }

    pub fn intervals(&self) -> TickerIntervals {
        TickerIntervals {
            clock: self.clock_interval.unwrap_or(DEFAULT_CLOCK_INTERVAL),
            countdowns: self.countdown_interval.unwrap_or(DEFAULT_COUNTDOWN_INTERVAL),
            theme: self.theme_interval.unwrap_or(DEFAULT_THEME_INTERVAL),
        }
    }

    pub fn list(&self, name: &str) -> Option<&RecordsView> {
        self.lists.iter().find(|view| view.name == name)
    }

    pub fn movies_path(&self) -> PathBuf {
        self.resolve_path(self.movies_path.as_deref().unwrap_or(DEFAULT_MOVIES_PATH))
    }

    /// Resolve a data path against the config directory. Empty stays empty.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = PathBuf::from(raw);
        if raw.is_empty() || path.is_absolute() {
            return path;
        }
        match &self.base_dir {
            Some(base) => base.join(path),
            None => path,
        }
    }

    pub fn log_config(&self) {
        let config_path = Self::get_config_path()
            .unwrap_or_else(|_| PathBuf::from("~/.config/together/together.toml"));

        Log::log_block_start(&format!(
            "Loaded configuration from {}",
            config_path.display()
        ));
        Log::log_indented(&format!(
            "Anchor date: {}",
            self.anchor_date.as_deref().unwrap_or(DEFAULT_ANCHOR_DATE)
        ));
        Log::log_indented(&format!(
            "Theme zone: {}",
            self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
        ));
        Log::log_indented(&format!(
            "Day starts: {}",
            self.day_start.as_deref().unwrap_or(DEFAULT_DAY_START)
        ));
        Log::log_indented(&format!(
            "Night starts: {}",
            self.night_start.as_deref().unwrap_or(DEFAULT_NIGHT_START)
        ));

        let intervals = self.intervals();
        Log::log_indented(&format!(
            "Refresh: clock {}s, countdowns {}s, theme {}s",
            intervals.clock, intervals.countdowns, intervals.theme
        ));

        if !self.countdowns.is_empty() {
            Log::log_indented(&format!("Countdowns: {}", self.countdowns.len()));
        }
        if !self.lists.is_empty() {
            let names: Vec<&str> = self.lists.iter().map(|view| view.name.as_str()).collect();
            Log::log_indented(&format!("Lists: {}", names.join(", ")));
        }
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str, field: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("Invalid {} '{}'. Use HH:MM or HH:MM:SS format", field, raw))
}

/// Check every field for values the dashboard cannot work with.
pub fn validate_config(config: &Config) -> Result<()> {
    config.anchor()?;
    config.theme_schedule()?;
    config.recurring_targets()?;

    for (name, interval) in [
        ("clock_interval", config.clock_interval),
        ("countdown_interval", config.countdown_interval),
        ("theme_interval", config.theme_interval),
    ] {
        if let Some(secs) = interval {
            if !(MINIMUM_INTERVAL..=MAXIMUM_INTERVAL).contains(&secs) {
                anyhow::bail!(
                    "{} must be between {} and {} seconds (got {})",
                    name,
                    MINIMUM_INTERVAL,
                    MAXIMUM_INTERVAL,
                    secs
                );
            }
        }
    }

    let mut names = HashSet::new();
    for view in &config.lists {
        if view.name.trim().is_empty() {
            anyhow::bail!("Every [[lists]] entry needs a name");
        }
        if !names.insert(view.name.as_str()) {
            anyhow::bail!("Duplicate list name '{}'", view.name);
        }
    }

    Ok(())
}

/// Builder for the commented default config file, with aligned comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{}]", title)));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{} = {}", key, value),
            comment: format!("# {}", comment),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{}{}{}", line, padding, comment));
                }
            }
        }

        result.push(String::new());
        result.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("together.toml");
        fs::write(&path, content).unwrap();
        (temp_dir, path)
    }

    #[test]
    #[serial]
    fn test_config_load_default_creation() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("together").join("together.toml");

        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        Log::set_enabled(false);
        let result = Config::load();
        Log::set_enabled(true);

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert!(result.is_ok());
        assert!(config_path.exists());
    }

    #[test]
    fn test_default_config_file_round_trips() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("together.toml");

        Config::create_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("anchor_date"));
        assert!(content.contains("night_start"));
        assert!(content.contains("movies_path"));

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.anchor_date.as_deref(), Some(TEST_ANCHOR));
        assert_eq!(config.timezone.as_deref(), Some(TEST_TIMEZONE));
        assert_eq!(config.day_start.as_deref(), Some(TEST_DAY_START));
        assert_eq!(config.night_start.as_deref(), Some(TEST_NIGHT_START));
    }

    #[test]
    fn test_empty_config_gets_defaults() {
        let (_temp_dir, path) = write_config("");
        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(
            config.anchor().unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 25).unwrap()
        );
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Shanghai);
        assert_eq!(
            config.intervals(),
            TickerIntervals {
                clock: 1,
                countdowns: 60,
                theme: 30
            }
        );
    }

    #[test]
    fn test_config_with_countdowns_and_lists() {
        let (_temp_dir, path) = write_config(
            r#"
anchor_date = "2024-02-14"
day_start = "07:00:00"
night_start = "19:15"

[[countdowns]]
name = "Birthday"
month = 3
day = 14

[[lists]]
name = "dates"
json_path = "data/dates.json"
primary_meta = "location"
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        let targets = config.recurring_targets().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].0, "Birthday");
        assert_eq!(targets[0].1, RecurringTarget::new(3, 14).unwrap());

        let schedule = config.theme_schedule().unwrap();
        assert_eq!(schedule.night_start(), NaiveTime::from_hms_opt(19, 15, 0).unwrap());

        let view = config.list("dates").unwrap();
        assert_eq!(view.primary_meta, "location");
        assert_eq!(view.count_template, DEFAULT_COUNT_TEMPLATE);
        assert!(config.list("trips").is_none());
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let (temp_dir, path) = write_config("movies_path = \"data/movies.json\"\n");
        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(
            config.movies_path(),
            temp_dir.path().join("data").join("movies.json")
        );
        assert_eq!(config.resolve_path(""), PathBuf::new());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let cases = [
            "anchor_date = \"25/11/2025\"",
            "timezone = \"Mars/Olympus_Mons\"",
            "day_start = \"6.30\"",
            "day_start = \"19:00\"\nnight_start = \"07:00\"",
            "clock_interval = 0",
            "theme_interval = 7200",
            "[[countdowns]]\nname = \"Nope\"\nmonth = 2\nday = 30",
            "[[lists]]\nname = \"a\"\n[[lists]]\nname = \"a\"",
        ];

        for case in cases {
            let (_temp_dir, path) = write_config(case);
            assert!(
                Config::load_from_path(&path).is_err(),
                "expected config to be rejected: {}",
                case
            );
        }
    }

    #[test]
    fn test_config_malformed_toml() {
        assert!(toml::from_str::<Config>("clock_interval = \"fast\"").is_err());
    }

    #[test]
    fn test_load_from_missing_path() {
        let temp_dir = tempdir().unwrap();
        let result = Config::load_from_path(&temp_dir.path().join("missing.toml"));
        assert!(result.is_err());
    }
}
