use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use fs2::FileExt;
use signal_hook::{
    consts::signal::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use together::args::{CliAction, ParsedArgs, display_help, display_version_info};
use together::config::Config;
use together::constants::*;
use together::dashboard::Dashboard;
use together::display;
use together::logger::Log;
use together::message_board;
use together::records;
use together::store::FileStore;
use together::theme::{Theme, clear_override};
use together::ticker::{Clock, SystemClock, Task, Ticker};

const CHECK_INTERVAL: Duration = Duration::from_secs(CHECK_INTERVAL_SECS);

/// `TOGETHER_DEBUG` set to anything but empty or `0` turns on debug output.
fn debug_from_env() -> bool {
    std::env::var("TOGETHER_DEBUG").is_ok_and(|value| !value.is_empty() && value != "0")
}

/// What the live loop last showed, so unchanged values are not repeated.
#[derive(Default)]
struct LiveState {
    shown_day: Option<NaiveDate>,
    shown_theme: Option<Theme>,
    next_boundary: Option<DateTime<Utc>>,
}

/// Run one ticker task against the dashboard.
fn run_task(
    task: Task,
    now: DateTime<Utc>,
    dashboard: &Dashboard,
    store_path: &Path,
    state: &mut LiveState,
) -> Result<()> {
    let local_now = now.with_timezone(&Local).naive_local();
    match task {
        Task::LiveClock => {
            Log::log_indented(&display::format_elapsed(&dashboard.elapsed(local_now)));
        }
        Task::Countdowns => {
            let today = local_now.date();
            if state.shown_day == Some(today) {
                Log::log_debug("Countdowns unchanged");
                return Ok(());
            }
            state.shown_day = Some(today);

            Log::log_block_start(&display::format_together_days(dashboard.together_days(today)));
            for countdown in dashboard.countdowns(today) {
                Log::log_indented(&display::format_countdown(&countdown));
            }
            if let Some(milestone) = dashboard.milestone(today) {
                Log::log_indented(&display::format_milestone(&milestone));
            }
        }
        Task::Theme => {
            state.next_boundary = None;
            // Reopened each time so one-shot commands from another shell are seen
            let mut store = FileStore::open(store_path)?;
            let status = dashboard.theme(now, &mut store);
            state.next_boundary = Some(status.next_boundary);

            let line = display::format_theme(&status, dashboard.schedule().timezone());
            if state.shown_theme == Some(status.theme) {
                Log::log_debug(&line);
            } else {
                state.shown_theme = Some(status.theme);
                Log::log_block_start(&line);
            }
        }
    }
    Ok(())
}

/// Perform cleanup operations when shutting down the application.
///
/// Releases the lock and removes the lock file from disk.
fn cleanup(lock_file: File, lock_path: &Path) {
    Log::log_decorated("Performing cleanup...");

    drop(lock_file);

    if let Err(e) = std::fs::remove_file(lock_path) {
        Log::log_warning(&format!("Failed to remove lock file: {}", e));
    } else {
        Log::log_debug("Lock file removed successfully");
    }

    Log::log_decorated("Cleanup complete");
}

fn lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("together.lock")
}

/// Live dashboard: refresh each task on its own interval until signalled.
fn run_dashboard() -> Result<()> {
    Log::log_version();

    // Set up signal handling
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    thread::spawn(move || {
        for signal in signals.forever() {
            Log::log_pipe();
            Log::log_info(&format!("Shutdown signal received: {:?}", signal));
            r.store(false, Ordering::SeqCst);
        }
    });

    // Create and acquire lock file
    let lock_path = lock_path();
    // Not truncated until the lock is held, so a running instance keeps its pid
    let mut lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        Log::log_error(
            "Another instance of together is already running.\n\
            • Stop it before starting a new dashboard.",
        );
        std::process::exit(EXIT_FAILURE);
    }
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Log::log_decorated("Lock acquired, starting together...");

    let config = Config::load()?;
    config.log_config();

    let dashboard = Dashboard::from_config(&config)?;
    let store_path = FileStore::default_path()?;
    Log::log_debug(&format!("Store: {}", store_path.display()));

    let clock = SystemClock;
    let mut ticker = Ticker::new(clock.now(), config.intervals());
    let mut state = LiveState::default();

    while running.load(Ordering::SeqCst) {
        let now = clock.now();
        let mut due = ticker.due(now);

        // A boundary crossing is handled at once instead of waiting for the next check
        if state.next_boundary.is_some_and(|boundary| now >= boundary)
            && !due.contains(&Task::Theme)
        {
            due.push(Task::Theme);
        }

        for task in due {
            if let Err(e) = run_task(task, now, &dashboard, &store_path, &mut state) {
                Log::log_warning(&format!("Refresh failed: {:#}", e));
                Log::log_decorated("Will retry on next cycle...");
            }
        }

        let mut sleep_duration = ticker.until_next(clock.now());
        if let Some(boundary) = state.next_boundary {
            let until_boundary = (boundary - clock.now()).to_std().unwrap_or(Duration::ZERO);
            sleep_duration = sleep_duration.min(until_boundary);
        }

        // Sleep in smaller intervals to check running status
        let mut slept = Duration::ZERO;
        while slept < sleep_duration && running.load(Ordering::SeqCst) {
            let sleep_chunk = CHECK_INTERVAL.min(sleep_duration - slept);
            thread::sleep(sleep_chunk);
            slept += sleep_chunk;
        }
    }

    Log::log_block_start("Shutting down together...");
    cleanup(lock_file, &lock_path);
    Log::log_end();
    Ok(())
}

fn load_dashboard() -> Result<(Config, Dashboard)> {
    let config = Config::load()?;
    if Log::is_debug() {
        config.log_config();
    }
    let dashboard = Dashboard::from_config(&config)?;
    Ok((config, dashboard))
}

fn run_status() -> Result<()> {
    Log::log_version();
    let (_, dashboard) = load_dashboard()?;
    let mut store = FileStore::open_default()?;

    let snapshot = dashboard.snapshot(SystemClock.now(), &mut store);
    let note = message_board::note(&store);
    display::print_snapshot(
        &snapshot,
        dashboard.schedule().timezone(),
        note.as_deref(),
    );
    Log::log_end();
    Ok(())
}

/// Record a manual theme, flipping the current one when `theme` is `None`.
fn run_set_theme(theme: Option<Theme>) -> Result<()> {
    Log::log_version();
    let (_, dashboard) = load_dashboard()?;
    let mut store = FileStore::open_default()?;
    let now = SystemClock.now();

    let schedule = dashboard.schedule();
    match theme {
        Some(theme) => schedule.record_manual_override(theme, now, &mut store)?,
        None => schedule.toggle(now, &mut store)?,
    };

    let status = dashboard.theme(now, &mut store);
    Log::log_block_start(&display::format_theme(&status, schedule.timezone()));
    Log::log_end();
    Ok(())
}

fn run_clear_theme() -> Result<()> {
    Log::log_version();
    let (_, dashboard) = load_dashboard()?;
    let mut store = FileStore::open_default()?;
    clear_override(&mut store)?;

    let status = dashboard.theme(SystemClock.now(), &mut store);
    Log::log_block_start(&display::format_theme(
        &status,
        dashboard.schedule().timezone(),
    ));
    Log::log_end();
    Ok(())
}

fn run_note(text: Option<String>) -> Result<()> {
    Log::log_version();
    let mut store = FileStore::open_default()?;

    match text {
        Some(text) => {
            let saved = message_board::save_note(&mut store, &text)?;
            Log::log_block_start("Message saved 💌");
            Log::log_indented(&saved);
        }
        None => match message_board::note(&store) {
            Some(note) => {
                Log::log_block_start("Message");
                Log::log_indented(&note);
            }
            None => Log::log_block_start("No message saved yet"),
        },
    }
    Log::log_end();
    Ok(())
}

fn run_movies() -> Result<()> {
    Log::log_version();
    let (config, _) = load_dashboard()?;
    let path = config.movies_path();

    let movies = records::load_movies(&path);
    if let Err(e) = &movies {
        Log::log_warning(&format!("{:#}", e));
    }
    display::print_lines(&display::render_movies(movies));
    Log::log_end();
    Ok(())
}

fn run_list(name: &str) -> Result<()> {
    Log::log_version();
    let (config, _) = load_dashboard()?;

    let Some(view) = config.list(name) else {
        Log::log_error(&format!("No list named '{}' in the configuration", name));
        std::process::exit(EXIT_FAILURE);
    };

    let path = config.resolve_path(&view.json_path);
    let loaded = records::load_records(&path);
    if let Err(e) = &loaded {
        Log::log_warning(&format!("{:#}", e));
    }

    Log::log_block_start(&view.name);
    display::print_lines(&display::render_records(view, loaded));
    Log::log_end();
    Ok(())
}

fn main() -> Result<()> {
    let parsed = ParsedArgs::from_env();
    Log::set_debug(parsed.action.debug_enabled() || debug_from_env());

    match parsed.action {
        CliAction::ShowVersion => {
            display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run { .. } => run_dashboard(),
        CliAction::Status { .. } => run_status(),
        CliAction::Toggle { .. } => run_set_theme(None),
        CliAction::SetTheme { theme, .. } => run_set_theme(Some(theme)),
        CliAction::ClearTheme { .. } => run_clear_theme(),
        CliAction::Note { text, .. } => run_note(text),
        CliAction::Movies { .. } => run_movies(),
        CliAction::List { name, .. } => run_list(&name),
    }
}
