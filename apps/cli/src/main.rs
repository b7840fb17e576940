//! Daybook CLI.
//!
//! Opens the task and topic store described by the config file and runs one
//! command against it. Results are printed as JSON.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entities::{Task, Topic};
use serde::Serialize;
use task_store::{
    init_tracing, validation, Database, StoreConfig, TaskStorage, TaskStore, TopicStorage,
    TopicStore,
};

/// Daybook - tasks and topics on the command line
#[derive(Debug, Parser)]
#[command(name = "daybook")]
#[command(about = "Inspect and edit the Daybook store", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.daybook/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config (`:memory:` for a scratch store)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create both tables if they are missing
    Init,

    /// Add a task
    AddTask {
        /// Task title
        title: String,
        /// Day, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Start time, HH:MM
        #[arg(long)]
        start: String,
        /// End time, HH:MM
        #[arg(long)]
        end: String,
        /// Task id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Reminder weekday, repeatable
        #[arg(long = "remind")]
        reminder_days: Vec<String>,
    },

    /// List tasks on a day
    Tasks {
        /// Day, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// PENDING, COMPLETED or CANCELLED
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one task
    ShowTask { id: String },

    /// Change a task's status
    SetStatus { id: String, status: String },

    /// Add a topic
    AddTopic {
        /// Owning user id
        #[arg(long)]
        user: String,
        /// Topic title
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<String>,
        /// Make the topic visible to other users
        #[arg(long)]
        public: bool,
    },

    /// List topics, optionally for one user
    Topics {
        #[arg(long)]
        user: Option<String>,
    },

    /// Delete a topic
    RemoveTopic { id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let path = cli.config.clone().unwrap_or_else(StoreConfig::default_path);
    let mut config = StoreConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?
        .apply_env()?;
    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }
    Ok(config)
}

async fn run(command: Commands, tasks: &dyn TaskStore, topics: &dyn TopicStore) -> Result<()> {
    match command {
        Commands::Init => {
            tasks.initialize().await?;
            topics.initialize().await?;
            println!("Store initialized");
        }
        Commands::AddTask {
            title,
            date,
            start,
            end,
            id,
            tags,
            reminder_days,
        } => {
            let mut task = Task::new(title, date, start, end)
                .with_tags(tags)
                .with_reminder_days(reminder_days);
            if let Some(id) = id {
                task = task.with_id(id);
            }
            tasks.create_task(&task).await?;
            print_json(&task)?;
        }
        Commands::Tasks { date, status } => {
            let status = status
                .as_deref()
                .map(validation::parse_status)
                .transpose()?;
            print_json(&tasks.load_tasks_by_date(&date, status).await?)?;
        }
        Commands::ShowTask { id } => {
            print_json(&tasks.get_task_by_id(&id).await?)?;
        }
        Commands::SetStatus { id, status } => {
            let status = validation::parse_status(&status)?;
            let task = tasks.get_task_by_id(&id).await?.with_status(status);
            let stored = tasks
                .update_task(&task)
                .await
                .with_context(|| format!("Failed to update task {id}"))?;
            print_json(&stored)?;
        }
        Commands::AddTopic {
            user,
            title,
            description,
            category,
            public,
        } => {
            let mut topic = Topic::new(user, title)
                .with_description(description)
                .public(public);
            topic.category = category;
            topics.create_topic(&topic).await?;
            print_json(&topic)?;
        }
        Commands::Topics { user } => {
            let listed = match user {
                Some(user) => topics.get_user_topics(&user).await?,
                None => topics.get_all_public_topics().await?,
            };
            print_json(&listed)?;
        }
        Commands::RemoveTopic { id } => {
            topics.remove_topic(&id).await?;
            println!("Removed {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level);
    tracing::debug!(database = %config.database_path.display(), "Opening store");

    let db = Arc::new(
        Database::from_config(&config)
            .await
            .context("Failed to open database")?,
    );
    let tasks = TaskStorage::new(Arc::clone(&db));
    let topics = TopicStorage::new(Arc::clone(&db));

    let result = run(cli.command, &tasks, &topics).await;
    db.close().await;
    result
}
