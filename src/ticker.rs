//! Periodic refresh scheduling over an injectable clock.
//!
//! The dashboard refreshes three things on independent cadences: the live
//! elapsed-time clock, the countdowns and the theme. `Ticker` tracks when each
//! is next due against a [`Clock`], so tests drive it with a [`ManualClock`]
//! instead of sleeping.

use chrono::{DateTime, TimeDelta, Utc};
use std::cell::Cell;
use std::time::Duration as StdDuration;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }

    pub fn advance(&self, by: StdDuration) {
        let next = TimeDelta::from_std(by)
            .ok()
            .and_then(|delta| self.now.get().checked_add_signed(delta));
        if let Some(next) = next {
            self.now.set(next);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Things the dashboard refreshes periodically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    LiveClock,
    Countdowns,
    Theme,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    task: Task,
    interval: TimeDelta,
    next_due: DateTime<Utc>,
}

/// Cadence of each task in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerIntervals {
    pub clock: u64,
    pub countdowns: u64,
    pub theme: u64,
}

/// Tracks when each periodic task is next due.
#[derive(Debug, Clone)]
pub struct Ticker {
    tasks: Vec<ScheduledTask>,
}

impl Ticker {
    /// All tasks are due at `start`.
    pub fn new(start: DateTime<Utc>, intervals: TickerIntervals) -> Self {
        let task = |task, secs: u64| ScheduledTask {
            task,
            // Intervals are validated to at least one second
            interval: TimeDelta::seconds(secs.max(1) as i64),
            next_due: start,
        };

        Self {
            tasks: vec![
                task(Task::LiveClock, intervals.clock),
                task(Task::Countdowns, intervals.countdowns),
                task(Task::Theme, intervals.theme),
            ],
        }
    }

    /// Tasks due at `now`, in declaration order.
    ///
    /// Each returned task moves to its first slot strictly after `now`.
    /// Slots missed during a long pause are skipped rather than replayed.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<Task> {
        let mut due = Vec::new();
        for scheduled in &mut self.tasks {
            if scheduled.next_due > now {
                continue;
            }
            due.push(scheduled.task);

            let behind = (now - scheduled.next_due).num_milliseconds();
            let step = scheduled.interval.num_milliseconds();
            let skipped = behind / step + 1;
            scheduled.next_due += TimeDelta::milliseconds(skipped * step);
        }
        due
    }

    /// Time until the earliest task is due; zero if one is already due.
    pub fn until_next(&self, now: DateTime<Utc>) -> StdDuration {
        self.tasks
            .iter()
            .map(|scheduled| scheduled.next_due)
            .min()
            .map(|next| (next - now).to_std().unwrap_or(StdDuration::ZERO))
            .unwrap_or(StdDuration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn intervals() -> TickerIntervals {
        TickerIntervals {
            clock: 1,
            countdowns: 60,
            theme: 30,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 5, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_all_tasks_due_at_start() {
        let mut ticker = Ticker::new(start(), intervals());
        assert_eq!(
            ticker.due(start()),
            vec![Task::LiveClock, Task::Countdowns, Task::Theme]
        );
        assert!(ticker.due(start()).is_empty());
    }

    #[test]
    fn test_tasks_fire_on_their_cadence() {
        let clock = ManualClock::new(start());
        let mut ticker = Ticker::new(clock.now(), intervals());
        ticker.due(clock.now());

        let mut clock_ticks = 0;
        let mut countdown_ticks = 0;
        let mut theme_ticks = 0;
        for _ in 0..120 {
            clock.advance(StdDuration::from_secs(1));
            for task in ticker.due(clock.now()) {
                match task {
                    Task::LiveClock => clock_ticks += 1,
                    Task::Countdowns => countdown_ticks += 1,
                    Task::Theme => theme_ticks += 1,
                }
            }
        }

        assert_eq!(clock_ticks, 120);
        assert_eq!(countdown_ticks, 2);
        assert_eq!(theme_ticks, 4);
    }

    #[test]
    fn test_long_pause_skips_missed_slots() {
        let clock = ManualClock::new(start());
        let mut ticker = Ticker::new(clock.now(), intervals());
        ticker.due(clock.now());

        clock.advance(StdDuration::from_secs(3600));
        assert_eq!(
            ticker.due(clock.now()),
            vec![Task::LiveClock, Task::Countdowns, Task::Theme]
        );
        assert!(ticker.due(clock.now()).is_empty());
        assert_eq!(ticker.until_next(clock.now()), StdDuration::from_secs(1));
    }

    #[test]
    fn test_until_next_tracks_earliest_task() {
        let mut ticker = Ticker::new(
            start(),
            TickerIntervals {
                clock: 10,
                countdowns: 60,
                theme: 30,
            },
        );
        assert_eq!(ticker.until_next(start()), StdDuration::ZERO);

        ticker.due(start());
        let later = start() + TimeDelta::seconds(4);
        assert_eq!(ticker.until_next(later), StdDuration::from_secs(6));
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::new(start());
        let target = start() + TimeDelta::hours(5);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
