//! Day/night theme scheduling with a short-lived manual override.
//!
//! The automatic theme follows two fixed boundaries evaluated in a
//! designated time zone, independent of the viewer's own zone: day begins at
//! `day_start` and night begins at `night_start` (06:30 and 18:30 by
//! default). A manual choice is stored with an expiry at the next boundary,
//! after which automation resumes.
//!
//! ## Key Functionality
//! - **Automatic theme**: day or night for a wall-clock time in the zone
//! - **Boundary timing**: milliseconds until the next switch, never below 1s
//! - **Overrides**: reading, expiring and recording a manual choice in a
//!   [`KeyValueStore`]

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    MILLIS_PER_DAY, MINIMUM_BOUNDARY_DELAY_MS, THEME_OVERRIDE_EXPIRES_KEY, THEME_OVERRIDE_KEY,
};
use crate::logger::Log;
use crate::store::KeyValueStore;

/// The two page themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Day,
    Night,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Day => "day",
            Theme::Night => "night",
        }
    }

    pub fn opposite(&self) -> Theme {
        match self {
            Theme::Day => Theme::Night,
            Theme::Night => Theme::Day,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Theme::Day),
            "night" => Ok(Theme::Night),
            other => bail!("Unknown theme '{}', expected 'day' or 'night'", other),
        }
    }
}

/// A manual theme choice and the instant it stops applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeOverride {
    pub theme: Theme,
    pub expires_at: DateTime<Utc>,
}

impl ThemeOverride {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Parse the two stored strings. `None` for anything malformed.
    fn parse(theme: &str, expires_at: &str) -> Option<Self> {
        let theme = theme.parse::<Theme>().ok()?;
        let millis = expires_at.trim().parse::<i64>().ok()?;
        let expires_at = DateTime::from_timestamp_millis(millis)?;
        Some(Self { theme, expires_at })
    }
}

/// Boundaries and zone for automatic theme switching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeSchedule {
    timezone: Tz,
    day_start: NaiveTime,
    night_start: NaiveTime,
}

impl ThemeSchedule {
    /// Build a schedule. Day must start before night within the same day.
    pub fn new(timezone: Tz, day_start: NaiveTime, night_start: NaiveTime) -> Result<Self> {
        if day_start >= night_start {
            bail!(
                "Day start ({}) must be earlier than night start ({})",
                day_start.format("%H:%M:%S"),
                night_start.format("%H:%M:%S")
            );
        }
        Ok(Self {
            timezone,
            day_start,
            night_start,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    pub fn night_start(&self) -> NaiveTime {
        self.night_start
    }

    /// Wall-clock time in the designated zone.
    pub fn time_in_zone(&self, now: DateTime<Utc>) -> NaiveTime {
        now.with_timezone(&self.timezone).time()
    }

    /// Automatic theme for a wall-clock time in the designated zone.
    ///
    /// Night from `night_start` (inclusive) through midnight until
    /// `day_start` (exclusive); day otherwise.
    pub fn auto_theme(&self, time_in_zone: NaiveTime) -> Theme {
        let now = time_in_zone.num_seconds_from_midnight();
        let day = self.day_start.num_seconds_from_midnight();
        let night = self.night_start.num_seconds_from_midnight();

        if now >= night || now < day {
            Theme::Night
        } else {
            Theme::Day
        }
    }

    /// Milliseconds until the next boundary, floored at one second.
    ///
    /// After `night_start` the next boundary is tomorrow's `day_start`.
    pub fn millis_until_next_boundary(&self, time_in_zone: NaiveTime) -> u64 {
        let now = millis_from_midnight(time_in_zone);
        let day = millis_from_midnight(self.day_start);
        let night = millis_from_midnight(self.night_start);

        let delay = if now < day {
            day - now
        } else if now < night {
            night - now
        } else {
            MILLIS_PER_DAY - now + day
        };

        delay.max(MINIMUM_BOUNDARY_DELAY_MS)
    }

    /// Automatic theme at an instant.
    pub fn theme_at(&self, now: DateTime<Utc>) -> Theme {
        self.auto_theme(self.time_in_zone(now))
    }

    /// Instant of the next automatic switch after `now`.
    ///
    /// The boundary is resolved as a wall-clock time in the zone, so a
    /// daylight-saving change before it does not shift the instant. Repeated
    /// local times take the earlier instant; a boundary that falls in a
    /// skipped hour is reached by elapsed time instead. The result is never
    /// less than one second away.
    pub fn next_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.timezone).naive_local();
        let delay = self.millis_until_next_boundary(local.time());
        let fallback = now + TimeDelta::milliseconds(delay as i64);

        let time = local.time();
        let date = if time < self.night_start {
            Some(local.date())
        } else {
            local.date().succ_opt()
        };
        let boundary = if time >= self.day_start && time < self.night_start {
            self.night_start
        } else {
            self.day_start
        };

        let zoned = date.and_then(|date| {
            self.timezone
                .from_local_datetime(&date.and_time(boundary))
                .earliest()
        });

        match zoned {
            Some(zoned) => {
                let floor = now + TimeDelta::milliseconds(MINIMUM_BOUNDARY_DELAY_MS as i64);
                zoned.with_timezone(&Utc).max(floor)
            }
            None => fallback,
        }
    }

    /// The stored override if it still applies.
    ///
    /// Expired or malformed overrides are removed from the store. A failure
    /// to remove them is logged and otherwise ignored.
    pub fn active_override<S: KeyValueStore + ?Sized>(
        &self,
        now: DateTime<Utc>,
        store: &mut S,
    ) -> Option<ThemeOverride> {
        let theme = store.get(THEME_OVERRIDE_KEY);
        let expires_at = store.get(THEME_OVERRIDE_EXPIRES_KEY);
        if theme.is_none() && expires_at.is_none() {
            return None;
        }

        let parsed = match (theme.as_deref(), expires_at.as_deref()) {
            (Some(theme), Some(expires_at)) => ThemeOverride::parse(theme, expires_at),
            _ => None,
        };

        match parsed {
            Some(theme_override) if theme_override.is_active(now) => Some(theme_override),
            Some(theme_override) => {
                Log::log_debug(&format!(
                    "Manual {} theme expired at {}",
                    theme_override.theme,
                    theme_override.expires_at.to_rfc3339()
                ));
                discard_override(store);
                None
            }
            None => {
                Log::log_debug("Discarding malformed theme override");
                discard_override(store);
                None
            }
        }
    }

    /// Theme in effect: an active override, otherwise the automatic theme.
    pub fn effective_theme<S: KeyValueStore + ?Sized>(
        &self,
        now: DateTime<Utc>,
        store: &mut S,
    ) -> Theme {
        match self.active_override(now, store) {
            Some(theme_override) => theme_override.theme,
            None => self.theme_at(now),
        }
    }

    /// Store a manual choice that lasts until the next boundary.
    ///
    /// Replaces any previous override.
    pub fn record_manual_override<S: KeyValueStore + ?Sized>(
        &self,
        theme: Theme,
        now: DateTime<Utc>,
        store: &mut S,
    ) -> Result<ThemeOverride> {
        let theme_override = ThemeOverride {
            theme,
            expires_at: self.next_boundary(now),
        };

        let millis = theme_override.expires_at.timestamp_millis().to_string();
        store
            .set_all(&[
                (THEME_OVERRIDE_KEY, theme.as_str()),
                (THEME_OVERRIDE_EXPIRES_KEY, &millis),
            ])
            .context("Failed to store theme override")?;

        Log::log_debug(&format!(
            "Manual {} theme until {}",
            theme,
            theme_override.expires_at.to_rfc3339()
        ));
        Ok(theme_override)
    }

    /// Switch to the opposite of the theme currently in effect.
    pub fn toggle<S: KeyValueStore + ?Sized>(
        &self,
        now: DateTime<Utc>,
        store: &mut S,
    ) -> Result<ThemeOverride> {
        let current = self.effective_theme(now, store);
        self.record_manual_override(current.opposite(), now, store)
    }
}

/// Remove any stored override so automatic switching applies again.
pub fn clear_override<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<()> {
    store
        .remove_all(&[THEME_OVERRIDE_KEY, THEME_OVERRIDE_EXPIRES_KEY])
        .context("Failed to clear theme override")
}

fn discard_override<S: KeyValueStore + ?Sized>(store: &mut S) {
    if let Err(e) = clear_override(store) {
        Log::log_warning(&format!("{:#}", e));
    }
}

fn millis_from_midnight(time: NaiveTime) -> u64 {
    u64::from(time.num_seconds_from_midnight()) * 1000
        + u64::from(time.nanosecond() % 1_000_000_000) / 1_000_000
}
