use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

use blogaggr::config::{parse_interval, Config};
use blogaggr::feed::Fetcher;
use blogaggr::scheduler::Scheduler;
use blogaggr::storage::{Database, DatabaseError};
use blogaggr::util::format_timestamp;

/// Get the config directory path (~/.config/blogaggr/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("blogaggr"))
}

#[derive(Parser, Debug)]
#[command(name = "blogaggr", about = "Poll RSS feeds on a schedule and store new posts")]
struct Args {
    /// Config file (default: ~/.config/blogaggr/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file, overriding the config file
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect feeds forever, one feed per interval (e.g. 30s, 1m, 1h30m)
    Agg {
        #[arg(value_name = "TIME_BETWEEN_REQS", value_parser = parse_interval)]
        interval: Duration,
    },
    /// List registered feeds
    Feeds,
    /// Delete all users, their feeds and posts
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // A malformed interval is rejected here, before config or database
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args
        .db
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| config_dir.join("blogaggr.db"));
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: The database at {} is locked.", db_path.display());
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    match args.command {
        Command::Agg { interval } => run_aggregator(db, &config, interval).await,
        Command::Feeds => list_feeds(&db).await,
        Command::Reset => {
            let removed = db
                .delete_all_users()
                .await
                .context("Couldn't delete all users")?;
            println!("Database reset ({} users removed).", removed);
            Ok(())
        }
    }
}

async fn run_aggregator(db: Database, config: &Config, interval: Duration) -> Result<()> {
    let fetcher = Fetcher::new(
        config.fetch_timeout(),
        &config.user_agent,
        config.max_feed_bytes,
    )
    .context("Failed to build HTTP client")?;
    let scheduler = Scheduler::new(db, fetcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    println!("Collecting feeds every {:?}...", interval);
    scheduler.run(interval, shutdown_rx).await;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C elsewhere).
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to install signal handlers, using Ctrl+C only");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

async fn list_feeds(db: &Database) -> Result<()> {
    let feeds = db.get_feeds().await.context("Couldn't get feeds")?;
    if feeds.is_empty() {
        println!("No feeds found.");
        return Ok(());
    }

    for feed in feeds {
        println!("Feed Name: {}", feed.name);
        println!("Feed URL: {}", feed.url);
        println!("Feed User Name: {}", feed.user_name);
        println!("Last Fetched: {}", format_timestamp(feed.last_fetched_at));
        println!("-------------------------");
    }
    Ok(())
}
