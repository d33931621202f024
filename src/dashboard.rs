//! Everything the dashboard shows, computed for one instant.
//!
//! `Dashboard` holds the configured anchor, countdown targets and theme
//! schedule. Each refresh task asks it for its own slice (elapsed time,
//! countdowns or theme), and `snapshot` gathers all of them at once for
//! one-shot output.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

use crate::config::Config;
use crate::constants::ANNIVERSARY_NAME;
use crate::date_math::{
    Countdown, ElapsedTime, Milestone, RecurringTarget, elapsed_time, next_milestone,
    next_recurrence, together_days,
};
use crate::store::KeyValueStore;
use crate::theme::{Theme, ThemeOverride, ThemeSchedule};

/// A countdown with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCountdown {
    pub name: String,
    pub countdown: Countdown,
}

/// Theme in effect and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeStatus {
    pub theme: Theme,
    pub theme_override: Option<ThemeOverride>,
    pub next_boundary: DateTime<Utc>,
}

/// All dashboard values at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub local_now: NaiveDateTime,
    pub together_days: i64,
    pub elapsed: ElapsedTime,
    pub countdowns: Vec<NamedCountdown>,
    pub milestone: Option<Milestone>,
    pub theme: ThemeStatus,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    anchor: NaiveDate,
    schedule: ThemeSchedule,
    targets: Vec<(String, RecurringTarget)>,
}

impl Dashboard {
    /// The anniversary of `anchor` always comes first, then `targets`.
    pub fn new(
        anchor: NaiveDate,
        schedule: ThemeSchedule,
        targets: Vec<(String, RecurringTarget)>,
    ) -> Self {
        let mut all = Vec::with_capacity(targets.len() + 1);
        all.push((
            ANNIVERSARY_NAME.to_string(),
            RecurringTarget::from_date(anchor),
        ));
        all.extend(targets);

        Self {
            anchor,
            schedule,
            targets: all,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.anchor()?,
            config.theme_schedule()?,
            config.recurring_targets()?,
        ))
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn schedule(&self) -> &ThemeSchedule {
        &self.schedule
    }

    pub fn together_days(&self, today: NaiveDate) -> i64 {
        together_days(self.anchor, today)
    }

    pub fn elapsed(&self, local_now: NaiveDateTime) -> ElapsedTime {
        elapsed_time(self.anchor, local_now)
    }

    pub fn countdowns(&self, today: NaiveDate) -> Vec<NamedCountdown> {
        self.targets
            .iter()
            .filter_map(|(name, target)| {
                next_recurrence(today, *target).map(|countdown| NamedCountdown {
                    name: name.clone(),
                    countdown,
                })
            })
            .collect()
    }

    pub fn milestone(&self, today: NaiveDate) -> Option<Milestone> {
        next_milestone(self.anchor, today)
    }

    pub fn theme<S: KeyValueStore + ?Sized>(&self, now: DateTime<Utc>, store: &mut S) -> ThemeStatus {
        let theme_override = self.schedule.active_override(now, store);
        let theme = match theme_override {
            Some(theme_override) => theme_override.theme,
            None => self.schedule.theme_at(now),
        };

        ThemeStatus {
            theme,
            theme_override,
            next_boundary: self.schedule.next_boundary(now),
        }
    }

    /// Snapshot using the machine's local zone for calendar values.
    pub fn snapshot<S: KeyValueStore + ?Sized>(&self, now: DateTime<Utc>, store: &mut S) -> Snapshot {
        let local_now = now.with_timezone(&Local).naive_local();
        self.snapshot_at(now, local_now, store)
    }

    /// Snapshot with an explicit local wall-clock time.
    pub fn snapshot_at<S: KeyValueStore + ?Sized>(
        &self,
        now: DateTime<Utc>,
        local_now: NaiveDateTime,
        store: &mut S,
    ) -> Snapshot {
        let today = local_now.date();
        Snapshot {
            local_now,
            together_days: self.together_days(today),
            elapsed: self.elapsed(local_now),
            countdowns: self.countdowns(today),
            milestone: self.milestone(today),
            theme: self.theme(now, store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{NaiveTime, TimeZone};

    fn dashboard() -> Dashboard {
        let schedule = ThemeSchedule::new(
            chrono_tz::Asia::Shanghai,
            NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        )
        .unwrap();
        Dashboard::new(
            NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(),
            schedule,
            vec![("Birthday".to_string(), RecurringTarget::new(3, 14).unwrap())],
        )
    }

    #[test]
    fn test_snapshot_values() {
        let dashboard = dashboard();
        let mut store = MemoryStore::new();

        // 2025-12-05 19:00 in Shanghai
        let now = Utc.with_ymd_and_hms(2025, 12, 5, 11, 0, 0).unwrap();
        let local_now = NaiveDate::from_ymd_opt(2025, 12, 5)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();

        let snapshot = dashboard.snapshot_at(now, local_now, &mut store);
        assert_eq!(snapshot.together_days, 10);
        assert_eq!(snapshot.elapsed.days, 10);
        assert_eq!(snapshot.elapsed.hours, 19);

        assert_eq!(snapshot.countdowns.len(), 2);
        assert_eq!(snapshot.countdowns[0].name, ANNIVERSARY_NAME);
        assert_eq!(
            snapshot.countdowns[0].countdown.target,
            NaiveDate::from_ymd_opt(2026, 11, 25).unwrap()
        );
        assert_eq!(snapshot.countdowns[1].name, "Birthday");
        assert_eq!(snapshot.countdowns[1].countdown.remaining_days, 99);

        let milestone = snapshot.milestone.unwrap();
        assert_eq!(milestone.value, 100);
        assert_eq!(milestone.remaining_days, 90);

        assert_eq!(snapshot.theme.theme, Theme::Night);
        assert!(snapshot.theme.theme_override.is_none());
        assert_eq!(
            snapshot.theme.next_boundary,
            Utc.with_ymd_and_hms(2025, 12, 5, 22, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_theme_reports_active_override() {
        let dashboard = dashboard();
        let mut store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 12, 5, 4, 0, 0).unwrap(); // noon in Shanghai

        dashboard
            .schedule()
            .record_manual_override(Theme::Night, now, &mut store)
            .unwrap();

        let status = dashboard.theme(now, &mut store);
        assert_eq!(status.theme, Theme::Night);
        assert_eq!(
            status.theme_override.map(|o| o.expires_at),
            Some(status.next_boundary)
        );
    }
}
