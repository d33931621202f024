//! Application constants and default values for together.
//!
//! This module contains the configuration defaults, validation limits,
//! store keys and operational constants used throughout the application.

// ═══ Application Configuration Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_ANCHOR_DATE: &str = "2025-11-25";
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai"; // Zone the theme boundaries are pinned to
pub const DEFAULT_DAY_START: &str = "06:30";
pub const DEFAULT_NIGHT_START: &str = "18:30";
pub const DEFAULT_CLOCK_INTERVAL: u64 = 1; // seconds - live elapsed-time clock
pub const DEFAULT_COUNTDOWN_INTERVAL: u64 = 60; // seconds - countdown refresh
pub const DEFAULT_THEME_INTERVAL: u64 = 30; // seconds - theme re-evaluation
pub const DEFAULT_MOVIES_PATH: &str = "data/movies.json";
pub const ANNIVERSARY_NAME: &str = "Anniversary";

// ═══ Records View Defaults ═══

pub const DEFAULT_COUNT_TEMPLATE: &str = "{count} records in total";
pub const DEFAULT_FOOTER_TEMPLATE: &str = "{count} records in total";
pub const DEFAULT_EMPTY_MAIN: &str = "No records yet";
pub const DEFAULT_ERROR_MAIN: &str = "Failed to load data";
pub const UNKNOWN_TIME: &str = "unknown time";
pub const UNTITLED: &str = "Untitled";
pub const POSTER_FALLBACK: &str = "movie";

// ═══ Validation Limits ═══

pub const MINIMUM_INTERVAL: u64 = 1; // seconds
pub const MAXIMUM_INTERVAL: u64 = 3600; // seconds (an hour between refreshes at most)

// ═══ Date Math ═══

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const MILESTONE_STEP: i64 = 100; // days between milestones

// ═══ Theme Scheduling ═══

pub const MILLIS_PER_DAY: u64 = 86_400_000;
pub const MINIMUM_BOUNDARY_DELAY_MS: u64 = 1000; // never schedule a zero or negative timer

// ═══ Key-Value Store ═══
// Keys shared with anything else reading the store file

pub const THEME_OVERRIDE_KEY: &str = "theme_override";
pub const THEME_OVERRIDE_EXPIRES_KEY: &str = "theme_override_expires_at";
pub const NOTE_KEY: &str = "love_message";

// ═══ Operational Timing Constants ═══

pub const CHECK_INTERVAL_SECS: u64 = 1; // How often to check the running flag during sleep

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1; // General failure
