use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use dailytasks::config::{self, Backend, Config};
use dailytasks::{TaskRecord, TaskStore, calendar};
use eyre::{Context, Result, eyre};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "dailytasks")]
#[command(about = "Jot down what you did today, newest first")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/dailytasks/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task data (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        /// Task text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Remove a task by id or unique id prefix
    Rm { id: String },

    /// List tasks, newest first
    List {
        /// Only tasks created today
        #[arg(long)]
        today: bool,
    },

    /// Show tasks grouped by day
    Groups,

    /// Remove every task
    Clear,

    /// Remove every task of one day: `today`, `yesterday` or YYYY-MM-DD
    ClearDay { day: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli)?;
    let storage = config.open_storage()?;
    let mut store = TaskStore::open_with_key(storage, config.slot_key.clone());

    match cli.command {
        Commands::Add { text } => {
            let text = text.join(" ");
            let text = text.trim();
            if text.is_empty() {
                return Err(eyre!("Task text cannot be empty"));
            }
            let task = store.create(text).context("Task added but could not be saved")?;
            println!("Added {}", format_task(&task));
        }
        Commands::Rm { id } => {
            let task = store.resolve(&id)?.clone();
            store.delete(&task.id).context("Task removed but could not be saved")?;
            println!("Removed {}", format_task(&task));
        }
        Commands::List { today } => {
            let tasks = if today {
                store.list_today()
            } else {
                store.list_all().to_vec()
            };

            if tasks.is_empty() {
                let empty = if today { "No tasks for today yet" } else { "No tasks yet" };
                println!("{}", empty.dimmed());
            }
            for task in &tasks {
                println!("{}", format_task(task));
            }
            if today {
                println!("{}", format!("{} tasks today", tasks.len()).dimmed());
            }
        }
        Commands::Groups => {
            let groups = store.group_by_day();
            if groups.is_empty() {
                println!("{}", "No tasks yet".dimmed());
            }
            for group in groups {
                println!("{} {}", group.label.to_string().bold().blue(), format!("({})", group.tasks.len()).dimmed());
                for task in &group.tasks {
                    println!("  {}", format_task(task));
                }
            }
        }
        Commands::Clear => {
            let count = store.delete_all().context("Tasks cleared but could not be saved")?;
            println!("Removed {} tasks", count);
        }
        Commands::ClearDay { day } => {
            let date = calendar::parse_day(&day, Local::now().date_naive())
                .ok_or_else(|| eyre!("Invalid day: {} (use today, yesterday or YYYY-MM-DD)", day))?;
            match store.group_by_day().into_iter().find(|g| g.day == date) {
                Some(group) => {
                    let count = store
                        .delete_group(&group.ids())
                        .context("Tasks removed but could not be saved")?;
                    println!("Removed {} tasks from {}", count, group.label);
                }
                None => println!("{}", format!("No tasks on {}", date).dimmed()),
            }
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => config::default_config_path(),
    };

    let mut config = match path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    Ok(config)
}

fn format_task(task: &TaskRecord) -> String {
    format!("{}  {}  {}", task.short_id().dimmed(), task.time_string().cyan(), task.text)
}
