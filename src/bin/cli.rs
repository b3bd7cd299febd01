//! dorkdex CLI
//!
//! Non-interactive entry point over the store, sync engine, and
//! execution dispatcher.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dorkdex::{
    dispatch::{Dispatcher, GoogleProvider, pacing_from_secs},
    error::{AppError, Result},
    models::Config,
    store::JsonStore,
    sync::{GhdbSource, SyncEngine},
};

/// dorkdex - Local GHDB dork corpus synchronizer
#[derive(Parser, Debug)]
#[command(
    name = "dorkdex",
    version,
    about = "Local GHDB dork corpus synchronizer and search dispatcher"
)]
struct Cli {
    /// Path to the data directory containing config and store files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the entire remote feed into the local store
    Sync {
        /// Override the configured page size
        #[arg(long)]
        page_size: Option<u64>,
    },

    /// Fetch only the newest page of the remote feed
    Update,

    /// Search stored dorks by keyword (matches title or query text)
    Search { keyword: String },

    /// List all categories
    Categories,

    /// List stored dorks in a category
    List { category: String },

    /// Show corpus statistics
    Stats,

    /// Run a dork against the search provider
    Run {
        /// Raw query text; omit to use --id
        query: Option<String>,

        /// Run the stored dork with this id instead
        #[arg(long, conflicts_with = "query")]
        id: Option<u64>,

        /// Maximum result locators to collect
        #[arg(long)]
        results: Option<usize>,

        /// Fixed pacing between provider requests in seconds
        /// (randomized within the configured range when omitted)
        #[arg(long)]
        pacing_secs: Option<f64>,
    },

    /// Mark or unmark a stored dork as favorite
    Favorite {
        id: u64,

        /// Clear the flag instead of setting it
        #[arg(long)]
        unset: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.data_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    config.validate()?;

    let mut store = JsonStore::open(cli.data_dir.join("dorks.json")).await?;

    match cli.command {
        Command::Sync { page_size } => {
            if let Some(size) = page_size {
                config.sync.page_size = size;
            }

            let stats = store.stats();
            log::info!("Current local corpus: {} dorks", stats.total_dorks);

            let source = GhdbSource::new(&config.sync)?;
            let mut engine = SyncEngine::new(source, config.sync.clone());
            let report = engine.full_sync(&mut store).await?;

            log::info!(
                "Synchronization complete: {} new dorks ({} records across {} pages)",
                report.new_count,
                report.records_seen,
                report.pages_fetched
            );
        }

        Command::Update => {
            let stats = store.stats();
            log::info!("Current local corpus: {} dorks", stats.total_dorks);
            log::info!("Checking for newest additions...");

            let source = GhdbSource::new(&config.sync)?;
            let mut engine = SyncEngine::new(source, config.sync.clone());
            let new_count = engine.incremental_sync(&mut store).await?;

            log::info!("Update complete: {} new dorks", new_count);
        }

        Command::Search { keyword } => {
            let hits = store.search_by_keyword(&keyword);
            if hits.is_empty() {
                log::warn!("No dorks matched '{}'", keyword);
            }
            for dork in hits {
                println!("{:>6}  [{}]  {}", dork.id, dork.category, dork.query_text);
            }
        }

        Command::Categories => {
            for category in store.list_categories() {
                println!("{:>4}  {}", category.ordinal, category.name);
            }
        }

        Command::List { category } => {
            let hits = store.list_by_category(&category);
            if hits.is_empty() {
                log::warn!("No dorks in category '{}'", category);
            }
            for dork in hits {
                println!(
                    "{:>6}  {}  {}",
                    dork.id,
                    dork.query_text,
                    dork.source_url.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Stats => {
            let stats = store.stats();
            println!("Total dorks      : {}", stats.total_dorks);
            println!("Total categories : {}", stats.total_categories);
            println!("Last sync        : {}", store.last_run_time());
        }

        Command::Run {
            query,
            id,
            results,
            pacing_secs,
        } => {
            let query_text = match (query, id) {
                (Some(text), _) => text,
                (None, Some(id)) => store
                    .get(id)
                    .map(|d| d.query_text.clone())
                    .ok_or_else(|| AppError::config(format!("no dork with id {id}")))?,
                (None, None) => {
                    return Err(AppError::config("provide a query or --id"));
                }
            };

            log::info!("Dispatching query: {}", query_text);
            log::warn!("Unauthorized testing is strictly prohibited.");

            let provider = GoogleProvider::new(&config.dispatch)?;
            let dispatcher = Dispatcher::new(provider, config.dispatch.clone());
            let max_results = results.unwrap_or(config.dispatch.max_results);
            let pacing = pacing_secs.map(pacing_from_secs).transpose()?;

            match dispatcher.run(&query_text, max_results, pacing).await {
                Ok(locators) => {
                    if locators.is_empty() {
                        log::warn!(
                            "Zero results returned. The dork may be strict or blocked."
                        );
                    }
                    for (i, locator) in locators.iter().enumerate() {
                        println!("[{}] {}", i + 1, locator);
                    }
                }
                Err(e) => log::error!("Search dispatch failed: {}", e),
            }
        }

        Command::Favorite { id, unset } => {
            if store.set_favorite(id, !unset) {
                store.snapshot().await?;
                log::info!(
                    "Dork {} {} favorites",
                    id,
                    if unset { "removed from" } else { "added to" }
                );
            } else {
                log::error!("No dork with id {}", id);
            }
        }
    }

    Ok(())
}
