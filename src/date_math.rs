//! Calendar arithmetic for the days-together counter and its countdowns.
//!
//! Everything here is a pure function of the anchor date and a reference
//! date or wall-clock instant. All differences are taken between calendar
//! dates (or naive wall-clock times), so there is no floating point and no
//! daylight-saving drift: a change of calendar day always moves the day
//! count by exactly one.
//!
//! ## Key Functionality
//! - **Days together**: whole calendar days since the anchor
//! - **Elapsed time**: the same span split into days/hours/minutes/seconds
//! - **Annual recurrences**: next birthday or anniversary on or after a date
//! - **Milestones**: the next multiple of 100 days together

use anyhow::{Result, bail};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::constants::{MILESTONE_STEP, SECONDS_PER_DAY};

/// Time since the anchor's midnight, split into calendar units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTime {
    pub days: i64,
    pub hours: u32,   // 0-23
    pub minutes: u32, // 0-59
    pub seconds: u32, // 0-59
}

impl ElapsedTime {
    /// Total seconds represented by this decomposition.
    pub fn total_seconds(&self) -> i64 {
        self.days * SECONDS_PER_DAY
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds)
    }
}

/// An annual event identified by month and day.
///
/// February 29 is accepted; in non-leap years it falls on February 28.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringTarget {
    month: u32,
    day: u32,
}

impl RecurringTarget {
    /// Validate a month/day pair against a leap year so every real date fits.
    pub fn new(month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Month must be between 1 and 12 (got {})", month);
        }
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            bail!("Day {} does not exist in month {}", day, month);
        }
        Ok(Self { month, day })
    }

    /// The recurring date of an existing calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// The occurrence in `year`, or `None` if the year is out of chrono's range.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).or_else(|| {
            // Only Feb 29 can fail for a validated target
            NaiveDate::from_ymd_opt(year, self.month, self.day - 1)
        })
    }
}

/// A countdown to a single future (or same-day) date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub target: NaiveDate,
    pub remaining_days: i64,
}

/// The next round number of days together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub value: i64,
    pub target: NaiveDate,
    pub remaining_days: i64,
}

/// Whole calendar days from the anchor to `reference`, never negative.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use together::date_math::together_days;
///
/// let anchor = NaiveDate::from_ymd_opt(2025, 11, 25).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
/// assert_eq!(together_days(anchor, reference), 10);
/// ```
pub fn together_days(anchor: NaiveDate, reference: NaiveDate) -> i64 {
    (reference - anchor).num_days().max(0)
}

/// Split the time since the anchor's midnight into days/hours/minutes/seconds.
///
/// `now` is a local wall-clock instant. Instants before the anchor give an
/// all-zero result. For every other instant the decomposition reconstructs
/// the total elapsed seconds exactly.
pub fn elapsed_time(anchor: NaiveDate, now: NaiveDateTime) -> ElapsedTime {
    let anchor_midnight = anchor.and_time(NaiveTime::MIN);
    let total_seconds = (now - anchor_midnight).num_seconds();
    if total_seconds < 0 {
        return ElapsedTime::default();
    }

    let days = together_days(anchor, now.date());
    let remainder = (total_seconds - days * SECONDS_PER_DAY).rem_euclid(SECONDS_PER_DAY);

    ElapsedTime {
        days,
        hours: (remainder / 3600) as u32,
        minutes: ((remainder % 3600) / 60) as u32,
        seconds: (remainder % 60) as u32,
    }
}

/// The next occurrence of `target` on or after `reference`.
///
/// A date earlier in the reference year rolls over to next year; a target
/// falling on the reference date itself counts down zero days.
pub fn next_recurrence(reference: NaiveDate, target: RecurringTarget) -> Option<Countdown> {
    let this_year = target.in_year(reference.year())?;
    let date = if this_year < reference {
        target.in_year(reference.year() + 1)?
    } else {
        this_year
    };

    Some(Countdown {
        target: date,
        remaining_days: (date - reference).num_days().max(0),
    })
}

/// The next multiple of 100 days together strictly after today's count.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use together::date_math::next_milestone;
///
/// let anchor = NaiveDate::from_ymd_opt(2025, 11, 25).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
/// let milestone = next_milestone(anchor, reference).unwrap();
/// assert_eq!(milestone.value, 100);
/// assert_eq!(milestone.target, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
/// assert_eq!(milestone.remaining_days, 90);
/// ```
pub fn next_milestone(anchor: NaiveDate, reference: NaiveDate) -> Option<Milestone> {
    let days = together_days(anchor, reference);
    let value = (days / MILESTONE_STEP + 1) * MILESTONE_STEP;
    let target = anchor.checked_add_days(Days::new(value as u64))?;

    Some(Milestone {
        value,
        target,
        remaining_days: (target - reference).num_days().max(0),
    })
}
