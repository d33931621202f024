//! Terminal rendering for dashboard values and list views.
//!
//! The `format_*` and `render_*` functions only build text so they can be
//! tested; the `print_*` helpers send that text through the structured
//! logger.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::dashboard::{NamedCountdown, Snapshot, ThemeStatus};
use crate::date_math::{ElapsedTime, Milestone};
use crate::logger::Log;
use crate::records::{Movie, Record, RecordEntry, RecordsView, sort_by_time_desc};

pub fn format_together_days(days: i64) -> String {
    format!("We have been together for {} days 💕", days)
}

pub fn format_elapsed(elapsed: &ElapsedTime) -> String {
    format!(
        "{} days {:02}h {:02}m {:02}s",
        elapsed.days, elapsed.hours, elapsed.minutes, elapsed.seconds
    )
}

pub fn format_countdown(named: &NamedCountdown) -> String {
    let countdown = &named.countdown;
    if countdown.remaining_days == 0 {
        format!("{}: today! ({})", named.name, countdown.target.format("%Y-%m-%d"))
    } else {
        format!(
            "{}: {} days ({})",
            named.name,
            countdown.remaining_days,
            countdown.target.format("%Y-%m-%d")
        )
    }
}

pub fn format_milestone(milestone: &Milestone) -> String {
    format!(
        "Day {}: {} days to go ({})",
        milestone.value,
        milestone.remaining_days,
        milestone.target.format("%Y-%m-%d")
    )
}

fn format_instant(instant: DateTime<Utc>, zone: Tz) -> String {
    instant.with_timezone(&zone).format("%H:%M").to_string()
}

pub fn format_theme(status: &ThemeStatus, zone: Tz) -> String {
    match status.theme_override {
        Some(theme_override) => format!(
            "Theme: {} (manual until {} {})",
            status.theme,
            format_instant(theme_override.expires_at, zone),
            zone.name()
        ),
        None => format!(
            "Theme: {} (auto, switches at {} {})",
            status.theme,
            format_instant(status.next_boundary, zone),
            zone.name()
        ),
    }
}

/// Print every dashboard value.
pub fn print_snapshot(snapshot: &Snapshot, zone: Tz, note: Option<&str>) {
    Log::log_block_start(&format_together_days(snapshot.together_days));
    Log::log_indented(&format_elapsed(&snapshot.elapsed));

    Log::log_block_start("Countdowns");
    for countdown in &snapshot.countdowns {
        Log::log_indented(&format_countdown(countdown));
    }
    if let Some(milestone) = &snapshot.milestone {
        Log::log_indented(&format_milestone(milestone));
    }

    Log::log_block_start(&format_theme(&snapshot.theme, zone));

    if let Some(note) = note {
        Log::log_block_start("Message");
        Log::log_indented(note);
    }
}

/// Gallery text for a movie list, or its empty/error state.
pub fn render_movies(movies: Result<Vec<Movie>>) -> Vec<String> {
    let mut lines = Vec::new();
    let movies = match movies {
        Ok(movies) => movies,
        Err(_) => {
            lines.push("We have watched 0 movies together 💕".to_string());
            lines.push("Failed to load the movie list".to_string());
            lines.push("Check that the movies file is readable".to_string());
            return lines;
        }
    };

    lines.push(format!("We have watched {} movies together 💕", movies.len()));
    if movies.is_empty() {
        lines.push("No movies added yet".to_string());
        lines.push("Go add some!".to_string());
        lines.push(movies_footer(0));
        return lines;
    }

    for movie in &movies {
        let mut line = format!("🎞 {}", movie.display_title());
        if let Some(time) = movie.time.as_deref().filter(|t| !t.is_empty()) {
            line.push_str(&format!(" ({})", time));
        }
        if let Some(url) = movie.image_url.as_deref().filter(|u| !u.is_empty()) {
            line.push_str(&format!(" [{}: {}]", movie.poster_label(), url));
        }
        lines.push(line);
    }
    lines.push(movies_footer(movies.len()));
    lines
}

fn movies_footer(count: usize) -> String {
    format!("{} movies recorded", count)
}

/// List text for a records view, newest first, or its empty/error state.
pub fn render_records(view: &RecordsView, records: Result<Vec<Record>>) -> Vec<String> {
    let mut lines = Vec::new();
    if !view.subtitle.is_empty() {
        lines.push(view.subtitle.clone());
    }

    let mut records = match records {
        Ok(records) => records,
        Err(_) => {
            lines.push(view.count_line(0));
            push_state(&mut lines, &view.error_main, &view.error_sub);
            return lines;
        }
    };

    lines.push(view.count_line(records.len()));
    if records.is_empty() {
        push_state(&mut lines, &view.empty_main, &view.empty_sub);
        lines.push(view.footer_line(0));
        return lines;
    }

    sort_by_time_desc(&mut records);
    for record in &records {
        let entry = RecordEntry::from_record(record, view);
        let mut head = format!("• {}", entry.title);
        if let Some(badge) = entry.badge {
            head.push_str(&format!(" [{}]", badge.label()));
        }
        lines.push(head);
        lines.push(format!("    {}", entry.time));
        if let Some(meta) = entry.meta {
            lines.push(format!("    {}", meta));
        }
        if let Some(note) = entry.note {
            lines.push(format!("    {}", note));
        }
        if let Some(thumb) = entry.thumb {
            lines.push(format!("    [{}]", thumb));
        }
        if let Some(detail) = entry.detail {
            lines.push(format!("    » {}", detail));
        }
    }
    lines.push(view.footer_line(records.len()));
    lines
}

fn push_state(lines: &mut Vec<String>, main: &str, sub: &str) {
    lines.push(main.to_string());
    if !sub.is_empty() {
        lines.push(sub.to_string());
    }
}

/// Print rendered lines: the first as a block header, the rest indented.
pub fn print_lines(lines: &[String]) {
    let mut iter = lines.iter();
    if let Some(first) = iter.next() {
        Log::log_block_start(first);
    }
    for line in iter {
        Log::log_indented(line);
    }
}
