//! thread-mirror main entry point
//!
//! This is the command-line interface for the incremental forum archiver.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use thread_mirror::config::{load_config_with_hash, Config};
use thread_mirror::output::{load_statistics, print_statistics, WriterProgress};
use thread_mirror::storage::open_storage;
use thread_mirror::sync::{drive_rounds, SyncEngine, ThreadCheck, ThreadFetch};
use thread_mirror::Credentials;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the forum's `authorization` header value
const AUTH_ENV: &str = "FORUM_AUTH";

/// Environment variable holding the forum's `cookie` header value
const COOKIE_ENV: &str = "FORUM_COOKIE";

/// thread-mirror: an incremental forum archiver
///
/// thread-mirror polls a forum's read API and mirrors its threads and posts
/// into SQLite. Each run discovers new threads, repairs gaps among recent
/// thread IDs, and catches up on new replies within a fixed request budget.
#[derive(Parser, Debug)]
#[command(name = "thread-mirror")]
#[command(version)]
#[command(about = "An incremental forum archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single round and print its result as JSON
    #[arg(long, conflicts_with_all = ["thread", "stats", "dry_run"])]
    once: bool,

    /// Bring one thread up to date and exit
    #[arg(long, value_name = "ID", conflicts_with_all = ["once", "stats", "dry_run"])]
    thread: Option<i64>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["once", "thread", "dry_run"])]
    stats: bool,

    /// Validate config and show the effective settings without syncing
    #[arg(long, conflicts_with_all = ["once", "thread", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let credentials = credentials_from_env();
    if credentials.is_anonymous() {
        tracing::warn!(
            "Neither {} nor {} is set, requests are anonymous",
            AUTH_ENV,
            COOKIE_ENV
        );
    }

    if let Some(thread_id) = cli.thread {
        handle_thread(&config, &credentials, thread_id, cli.quiet).await
    } else if cli.once {
        handle_once(&config, &credentials, cli.quiet).await
    } else {
        handle_sync(&config, &credentials, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("thread_mirror=info,warn"),
            1 => EnvFilter::new("thread_mirror=debug,info"),
            2 => EnvFilter::new("thread_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn credentials_from_env() -> Credentials {
    Credentials::new(
        std::env::var(AUTH_ENV).ok(),
        std::env::var(COOKIE_ENV).ok(),
    )
}

fn build_engine(config: &Config) -> anyhow::Result<SyncEngine<thread_mirror::SqliteStorage>> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;
    Ok(SyncEngine::from_config(config, storage)?)
}

/// Where progress lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressTarget {
    Stdout,
    Stderr,
    Discard,
}

impl ProgressTarget {
    /// Progress goes to stdout unless suppressed, or unless stdout carries a
    /// machine-readable result
    fn select(quiet: bool, json_on_stdout: bool) -> Self {
        if quiet {
            ProgressTarget::Discard
        } else if json_on_stdout {
            ProgressTarget::Stderr
        } else {
            ProgressTarget::Stdout
        }
    }
}

fn progress_sink(target: ProgressTarget) -> WriterProgress<Box<dyn std::io::Write + Send>> {
    match target {
        ProgressTarget::Stdout => WriterProgress::new(Box::new(std::io::stdout())),
        ProgressTarget::Stderr => WriterProgress::new(Box::new(std::io::stderr())),
        ProgressTarget::Discard => WriterProgress::new(Box::new(std::io::sink())),
    }
}

/// Handles the --dry-run mode: validates config and shows effective settings
fn handle_dry_run(config: &Config) {
    println!("=== thread-mirror Dry Run ===\n");

    println!("Forum API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  User agent: {}", config.api.user_agent);
    println!("  Page size: {}", config.api.page_size);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.api.request_timeout_secs, config.api.connect_timeout_secs
    );

    let limits = &config.sync;
    println!("\nSync Limits:");
    println!("  Max concurrent requests: {}", limits.max_concurrent);
    println!(
        "  New threads: {} listing pages, {} per round",
        limits.new_thread_page_cap, limits.new_thread_cap
    );
    println!("  Backfill window: {} IDs", limits.backfill_window);
    println!(
        "  Reply catch-up: {} listing pages, {} updates per round",
        limits.reply_page_cap, limits.reply_update_budget
    );
    println!("  Post pages per incremental fetch: {}", limits.comment_page_cap);
    println!("  Max rounds per run: {}", limits.max_rounds);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let credentials = credentials_from_env();
    println!("\nCredentials: {:?}", credentials);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --thread mode: checks one thread on demand
async fn handle_thread(
    config: &Config,
    credentials: &Credentials,
    thread_id: i64,
    quiet: bool,
) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let progress = progress_sink(ProgressTarget::select(quiet, false));

    let check = engine
        .check_thread(credentials, &progress, thread_id)
        .await
        .with_context(|| format!("Failed to check thread {}", thread_id))?;

    let summary = match check {
        ThreadCheck::Fetched(ThreadFetch::Stored { comments }) => {
            format!("fetched with {} posts", comments)
        }
        ThreadCheck::Fetched(ThreadFetch::Tombstoned { status }) => {
            format!("inaccessible (status {})", status)
        }
        ThreadCheck::Fetched(ThreadFetch::Skipped) => "skipped, incomplete response".to_string(),
        ThreadCheck::UpToDate { replies } => format!("up to date ({} replies)", replies),
        ThreadCheck::Updated { new_comments } => format!("{} new posts", new_comments),
        ThreadCheck::Unavailable => "details unavailable, nothing written".to_string(),
    };
    tracing::info!("Thread {}: {}", thread_id, summary);

    Ok(())
}

/// Handles the --once mode: one round, JSON result alone on stdout
async fn handle_once(
    config: &Config,
    credentials: &Credentials,
    quiet: bool,
) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let progress = progress_sink(ProgressTarget::select(quiet, true));

    let outcome = engine
        .run_round(credentials, &progress)
        .await
        .context("Sync round failed")?;

    println!("{}", serde_json::to_string(&outcome)?);

    Ok(())
}

/// Handles the default mode: rounds until caught up or the round limit
async fn handle_sync(
    config: &Config,
    credentials: &Credentials,
    quiet: bool,
) -> anyhow::Result<()> {
    tracing::info!("Mirroring {}", config.api.base_url);

    let engine = build_engine(config)?;
    let progress = progress_sink(ProgressTarget::select(quiet, false));

    match drive_rounds(&engine, credentials, &progress).await {
        Ok(summary) => {
            tracing::info!(
                "Sync completed: {} rounds, {} new threads, {} reply updates",
                summary.rounds,
                summary.processed_new_threads,
                summary.updated_replies
            );
            if summary.has_more {
                tracing::warn!("Round limit reached with work remaining");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sync failed: {}", e);
            Err(e.into())
        }
    }
}
