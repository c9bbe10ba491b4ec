//! Command-line front end.
//! Parses arguments and runs deck management, queue, review and backup commands
//! against the SQLite store.

use chrono::Duration;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use vocab_review::export::{create_backup, export_backup_to_path, import_backup, restore_backup};
use vocab_review::scheduling::{DailyLimiter, ReviewQueueBuilder, weakest_items};
use vocab_review::session::{review_item, reviews_done_today};
use vocab_review::{
    DeckStats, OffsetClock, ReviewError, ReviewScheduler, ReviewSession,
    ReviewSubmission, SchedulerConfig, SqliteStore, StateStore,
};

type AppResult<T = ()> = Result<T, Box<dyn Error>>;
type Scheduler = ReviewScheduler<OffsetClock>;

#[derive(Parser, Debug)]
#[command(name = "vocab-review", version, about = "Spaced-repetition vocabulary reviews")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "db.sqlite3")]
    pub db: PathBuf,

    /// Scheduler configuration (TOML). Defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "scheduler.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a word to the deck
    Add { word: String, definition: String },
    /// List the items due today
    Queue {
        /// Print item ids as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a review: grade is again/hard/good/easy or 1-4
    Review { item_id: i64, grade: String },
    /// Review today's queue interactively
    Study,
    /// Show deck progress
    Stats {
        /// How many of the weakest items to list
        #[arg(long, default_value_t = 5)]
        weakest: usize,
    },
    /// Move the simulated date forward by one day
    AdvanceDay,
    /// Write all items and schedules to a JSON file
    Export { path: PathBuf },
    /// Restore items and schedules from a JSON file
    Import { path: PathBuf },
}

pub fn run(cli: Cli) -> AppResult {
    let config = SchedulerConfig::load_or_default(&cli.config)?;
    let store = SqliteStore::open(&cli.db)?;
    let clock = OffsetClock {
        offset: Duration::days(store.day_offset()?),
    };
    let scheduler = ReviewScheduler::with_clock(config, clock)?;

    match cli.command {
        Command::Add { word, definition } => add(&store, &scheduler, &word, &definition),
        Command::Queue { json } => queue(&store, &scheduler, json),
        Command::Review { item_id, grade } => review(&store, &scheduler, item_id, grade),
        Command::Study => study(store, scheduler),
        Command::Stats { weakest } => stats(&store, &scheduler, weakest),
        Command::AdvanceDay => {
            let offset = store.advance_day()?;
            println!("Simulated date is now {} day(s) ahead", offset);
            println!("Today: {}", store.current_date()?.format("%Y-%m-%d"));
            Ok(())
        }
        Command::Export { path } => {
            let backup = create_backup(&store, scheduler.now())?;
            export_backup_to_path(&backup, &path)?;
            println!("Exported {} items to {}", backup.entries.len(), path.display());
            Ok(())
        }
        Command::Import { path } => {
            let backup = import_backup(&path)?;
            let restored = restore_backup(&store, &backup)?;
            println!("Imported {} items from {}", restored, path.display());
            Ok(())
        }
    }
}

fn add(store: &SqliteStore, scheduler: &Scheduler, word: &str, definition: &str) -> AppResult {
    let id = store.add_item(
        word,
        definition,
        scheduler.config().initial_ease_factor,
        scheduler.now(),
    )?;
    println!("Added '{}' (id {})", word, id);
    Ok(())
}

fn todays_queue(store: &SqliteStore, scheduler: &Scheduler) -> AppResult<(Vec<i64>, usize)> {
    let now = scheduler.now();
    let snapshot = store.load_all_states()?;
    let done = reviews_done_today(store, now)?;
    let limiter = DailyLimiter::new(scheduler.config().daily_review_cap);
    let queue = ReviewQueueBuilder::new(limiter).todays_queue(&snapshot, now, done);
    Ok((queue, limiter.remaining(done)))
}

fn queue(store: &SqliteStore, scheduler: &Scheduler, json: bool) -> AppResult {
    let (queue, remaining) = todays_queue(store, scheduler)?;

    if json {
        println!("{}", serde_json::to_string(&queue)?);
        return Ok(());
    }

    if queue.is_empty() {
        println!("Nothing due. Come back later!");
        return Ok(());
    }

    if remaining == usize::MAX {
        println!("{} item(s) due:", queue.len());
    } else {
        println!("{} item(s) due, {} review(s) left today:", queue.len(), remaining);
    }
    for id in queue {
        let item = store.get_item(id)?;
        let state = store.load_state(id)?;
        let phase = if state.is_graduated {
            "review"
        } else {
            "learning"
        };
        println!("  [{}] {} ({}, mastery {})", id, item.word, phase, state.mastery_level);
    }
    Ok(())
}

fn review(store: &SqliteStore, scheduler: &Scheduler, item_id: i64, grade: String) -> AppResult {
    let submission = ReviewSubmission::new(item_id, grade).at(scheduler.now());
    match review_item(store, scheduler, &submission) {
        Ok(outcome) => {
            print_outcome(store, &outcome)?;
            Ok(())
        }
        Err(ReviewError::StaleSubmission { .. }) => {
            println!("Item {} was already reviewed", item_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(store: &SqliteStore, outcome: &vocab_review::ReviewOutcome) -> AppResult {
    let item = store.get_item(outcome.state.item_id)?;
    let state = &outcome.state;
    if outcome.graduated_this_review {
        println!("'{}' graduated!", item.word);
    } else if outcome.lapsed_this_review {
        println!("'{}' back to learning", item.word);
    }
    println!(
        "Next review of '{}': {} (mastery {})",
        item.word,
        state.next_review_at.format("%Y-%m-%d %H:%M"),
        state.mastery_level
    );
    Ok(())
}

fn study(store: SqliteStore, scheduler: Scheduler) -> AppResult {
    let store = Arc::new(Mutex::new(store));
    let mut session = ReviewSession::start(store.clone(), scheduler)?;

    if session.is_completed() {
        println!("Nothing due. Come back later!");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(id) = session.current_item_id() {
        let item = {
            let store = store.lock().unwrap_or_else(|e| e.into_inner());
            store.get_item(id)?
        };

        println!("\n{}", session.progress_message());
        println!("  {}", item.word);
        prompt("  (press Enter to show the definition) ")?;
        if lines.next().transpose()?.is_none() {
            break;
        }
        println!("  {}", item.definition);

        prompt("  Grade [again/hard/good/easy or 1-4, q to quit]: ")?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim() == "q" {
            break;
        }

        match session.grade_current(line.trim()) {
            Ok(Some(outcome)) => {
                let store = store.lock().unwrap_or_else(|e| e.into_inner());
                print_outcome(&store, &outcome)?;
            }
            Ok(None) => break,
            Err(ReviewError::InvalidGrade(raw)) => println!("  Unrecognised grade {:?}", raw),
            Err(e) => return Err(e.into()),
        }
    }

    let graduated = session.events().iter().filter(|e| e.graduated_this_review).count();
    let lapsed = session.events().iter().filter(|e| e.lapsed_this_review).count();
    println!(
        "\nSession over: {} reviewed, {} graduated, {} lapsed",
        session.reviewed_count(),
        graduated,
        lapsed
    );
    Ok(())
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{}", text);
    io::stdout().flush()
}

fn stats(store: &SqliteStore, scheduler: &Scheduler, weakest: usize) -> AppResult {
    let states = store.load_all_states()?;
    let stats = DeckStats::from_states(&states, scheduler.now());

    println!("Items:     {}", stats.total);
    println!("Learning:  {}", stats.learning);
    println!("Graduated: {}", stats.graduated);
    println!("Due now:   {}", stats.due);
    match stats.average_mastery {
        Some(avg) => println!("Average mastery: {:.1}", avg),
        None => println!("Average mastery: -"),
    }

    let needs_practice = weakest_items(&states, weakest);
    if !needs_practice.is_empty() {
        println!("Needs practice:");
        for id in needs_practice {
            let item = store.get_item(id)?;
            let state = states.iter().find(|s| s.item_id == id);
            let mastery = state.map(|s| s.mastery_level).unwrap_or(0);
            println!("  [{}] {} (mastery {})", id, item.word, mastery);
        }
    }
    Ok(())
}
