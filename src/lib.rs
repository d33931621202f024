//! # Together
//!
//! A terminal dashboard for counting the days since a relationship began.
//!
//! Together shows how long two people have been together, live to the second,
//! counts down to the anniversary and other yearly dates, tracks the next
//! hundred-day milestone and keeps a day/night theme in step with a chosen
//! time zone. A manual theme choice lasts until the next automatic switch.
//!
//! ## Architecture
//!
//! - **args**: Command-line parsing into a single action
//! - **config**: Configuration loading, validation, and default generation
//! - **constants**: Application-wide constants and defaults
//! - **dashboard**: All dashboard values computed for one instant
//! - **date_math**: Pure calendar arithmetic (day counts, countdowns, milestones)
//! - **display**: Text rendering of dashboard values and list views
//! - **logger**: Structured logging with visual formatting
//! - **message_board**: A single saved note
//! - **records**: JSON-backed movie and record lists
//! - **store**: Persistent key-value storage
//! - **theme**: Day/night scheduling and manual overrides
//! - **ticker**: Periodic refresh scheduling over an injectable clock

pub mod args;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod date_math;
pub mod display;
pub mod logger;
pub mod message_board;
pub mod records;
pub mod store;
pub mod theme;
pub mod ticker;

// Re-export important types for easier access
pub use config::Config;
pub use dashboard::{Dashboard, Snapshot};
pub use logger::{Log, LogLevel};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{Theme, ThemeOverride, ThemeSchedule};
pub use ticker::{Clock, SystemClock, Task, Ticker, TickerIntervals};
