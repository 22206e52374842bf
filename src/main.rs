mod app;
mod domain;
mod logging;
mod repo;
mod store;
mod theme;
mod ui;
mod view;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use time::Duration as Days;

use app::App;
use domain::clock::{Clock, SystemClock};
use domain::dates::date_key;
use domain::task::{Task, TaskId};
use repo::KeyValueStore;
use repo::memory::InMemoryStore;
use repo::sqlite::SqliteStore;
use store::{TASKS_KEY, TaskStore};
use theme::Theme;
use view::{Dashboard, Marker, MonthCursor};

#[derive(Parser, Debug)]
#[command(author, version, about = "tally: personal task tracker with a completion dashboard", long_about = None)]
struct Args {
    /// Tick interval of render loop in milliseconds
    #[arg(long, default_value_t = 120)]
    tick_ms: u64,

    /// Start with demo tasks (in memory, nothing is saved)
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Use in-memory store instead of SQLite
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// Path to SQLite DB file (default: OS data dir)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log file used when RUST_LOG is set (default: OS data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Add a task dated today
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Flip a task between done and pending
    Toggle { id: TaskId },
    /// Delete a task
    Delete { id: TaskId },
    /// Print all tasks, newest first
    List,
    /// Print the 7-day series, the done/pending ratio and this month's days
    Stats,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(err) = logging::init(args.log_file.clone()) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let repo = open_repo(&args)?;
    let theme = Theme::load(&repo).context("failed to load theme settings")?;
    let mut store = TaskStore::load(repo, SystemClock)?;

    match args.command {
        None => ui::run(App::new(store, theme), Duration::from_millis(args.tick_ms)),
        Some(cmd) => run_command(&mut store, cmd),
    }
}

fn open_repo(args: &Args) -> Result<Box<dyn KeyValueStore>> {
    Ok(if args.demo {
        let tasks = seed_tasks(&SystemClock);
        let encoded = serde_json::to_string(&tasks).context("failed to encode demo tasks")?;
        Box::new(InMemoryStore::with_seed([(TASKS_KEY, encoded)]))
    } else if args.memory {
        Box::new(InMemoryStore::default())
    } else if let Some(path) = args.db_path.as_ref() {
        Box::new(SqliteStore::open(path)?)
    } else {
        Box::new(SqliteStore::open_default()?)
    })
}

fn seed_tasks(clock: &impl Clock) -> Vec<Task> {
    let today = clock.today();
    let base = clock.now_millis();
    let samples = [
        ("Write documentation", 0, false),
        ("Review pull requests", 0, true),
        ("Draft release notes", 1, true),
        ("Plan sprint", 2, true),
        ("Water plants", 2, false),
        ("Renew passport", 4, true),
        ("Call the bank", 6, true),
    ];
    samples
        .into_iter()
        .enumerate()
        .filter_map(|(idx, (text, days_ago, done))| {
            let date = today.checked_sub(Days::days(days_ago))?;
            let task = Task::new(base - idx as i64, text, date);
            Some(if done { task.into_completed() } else { task })
        })
        .collect()
}

fn run_command<R: KeyValueStore, C: Clock>(store: &mut TaskStore<R, C>, cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::Add { text } => {
            if let Some(task) = store.add(&text.join(" "))? {
                println!("{}", format_task(&task));
            }
        }
        Cmd::Toggle { id } => match store.toggle(id)? {
            Some(task) => println!("{}", format_task(&task)),
            None => println!("no task with id {id}"),
        },
        Cmd::Delete { id } => match store.remove(id)? {
            Some(task) => println!("deleted {}", format_task(&task)),
            None => println!("no task with id {id}"),
        },
        Cmd::List => {
            for task in store.tasks() {
                println!("{}", format_task(task));
            }
        }
        Cmd::Stats => {
            let today = store.today();
            let dash = Dashboard::compute(store.tasks(), MonthCursor::containing(today), today);
            print!("{}", format_stats(&dash));
        }
    }
    Ok(())
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    format!("[{mark}] {} {} {}", task.id, date_key(task.date), task.text)
}

fn format_stats(dash: &Dashboard) -> String {
    let mut out = String::from("Completed, last 7 days:\n");
    for day in &dash.series.days {
        out.push_str(&format!(
            "  {} {}  {}\n",
            day.day.label,
            date_key(day.day.date),
            day.completed
        ));
    }
    out.push_str(&format!(
        "Done {} / Pending {}\n",
        dash.ratio.completed, dash.ratio.pending
    ));
    out.push_str(&format!("{}:\n", dash.calendar.title()));
    for day in dash.calendar.days.iter().filter(|d| d.task_count > 0) {
        let dots: String = day
            .markers
            .iter()
            .map(|m| match m {
                Marker::Completed => '●',
                Marker::Pending => '○',
            })
            .collect();
        out.push_str(&format!(
            "  {} {:<3} ({} tasks)\n",
            date_key(day.date),
            dots,
            day.task_count
        ));
    }
    out
}
