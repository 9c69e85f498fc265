//! Listing-Harvester main entry point
//!
//! This is the command-line interface for the Listing-Harvester crawler.

use anyhow::{bail, Context};
use clap::Parser;
use listing_harvester::config::{load_config_with_hash, Config};
use listing_harvester::crawler::{CrawlEvent, CrawlOrchestrator, RunOutcome};
use listing_harvester::output::{self, print_checkpoint_summary, ExportKind};
use listing_harvester::record::format_elapsed;
use listing_harvester::source::HtmlPageAccessor;
use listing_harvester::storage::{open_store, CheckpointStore, SqliteCheckpointStore};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Listing-Harvester: an incremental, checkpointed listing crawler
///
/// Walks a paginated listing one item at a time, extracts a record per item
/// and exports the results. Interrupted runs resume from the last checkpoint.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version)]
#[command(about = "An incremental, checkpointed listing crawler", long_about = None)]
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

    /// Start a fresh crawl, discarding any stored checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["show_checkpoint", "export", "clear_checkpoint"])]
    dry_run: bool,

    /// Show the stored checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export", "clear_checkpoint"])]
    show_checkpoint: bool,

    /// Print the stored checkpoint's records in the given format and exit
    #[arg(long, value_name = "KIND", conflicts_with_all = ["dry_run", "show_checkpoint", "clear_checkpoint"])]
    export: Option<ExportKind>,

    /// Delete the stored checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "show_checkpoint", "export"])]
    clear_checkpoint: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.show_checkpoint {
        handle_show_checkpoint(&config)?;
    } else if let Some(kind) = cli.export {
        handle_export(&config, kind)?;
    } else if cli.clear_checkpoint {
        handle_clear_checkpoint(&config)?;
    } else {
        handle_crawl(config, config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_checkpoint_store(config: &Config) -> anyhow::Result<SqliteCheckpointStore> {
    let path = Path::new(&config.checkpoint.database_path);
    open_store(path, &config.checkpoint.session_key)
        .with_context(|| format!("failed to open checkpoint database {}", path.display()))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Harvester Dry Run ===\n");

    println!("Crawl:");
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Skip duplicates: {}", config.crawl.skip_duplicates);
    println!("  Human-like pacing: {}", config.crawl.anti_detection);

    println!("\nTiming:");
    println!(
        "  Action delay: {}-{}ms",
        config.timing.min_delay, config.timing.max_delay
    );
    println!("  Page delay: {}ms", config.timing.page_delay);
    println!(
        "  Coffee break: every {} actions, ~{}ms",
        config.timing.coffee_break_interval, config.timing.coffee_break_duration
    );
    println!("  Detail timeout: {}ms", config.timing.detail_timeout);

    println!("\nCheckpoint:");
    println!("  Database: {}", config.checkpoint.database_path);
    println!("  Session key: {}", config.checkpoint.session_key);
    if config.checkpoint.auto_save {
        println!("  Auto-save every {} items", config.checkpoint.save_interval);
    } else {
        println!("  Auto-save disabled");
    }

    println!("\nOutput:");
    println!("  Format: {}", config.output.format);
    println!("  Path: {}", config.output.path);

    match &config.source {
        Some(source) => {
            println!("\nSource:");
            println!("  Listing: {}", source.listing_url);
            println!(
                "  Pagination: {}={} (+{} per page)",
                source.page_param, source.page_start, source.page_step
            );
            println!("  Item selector: {}", source.selectors.item);
        }
        None => println!("\nSource: none configured"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --show-checkpoint mode
fn handle_show_checkpoint(config: &Config) -> anyhow::Result<()> {
    let store = open_checkpoint_store(config)?;
    println!("Database: {}\n", config.checkpoint.database_path);

    match store.load()? {
        Some(checkpoint) => print_checkpoint_summary(&checkpoint),
        None => println!("No checkpoint stored for '{}'", config.checkpoint.session_key),
    }
    Ok(())
}

/// Handles the --export mode: renders the records of the stored session
fn handle_export(config: &Config, kind: ExportKind) -> anyhow::Result<()> {
    let store = open_checkpoint_store(config)?;
    let Some(checkpoint) = store.load()? else {
        bail!(
            "no checkpoint stored for '{}'",
            config.checkpoint.session_key
        );
    };

    let records = match store.load_records(&checkpoint.session_id)? {
        Some(records) => records,
        None => {
            tracing::warn!("No record list stored; exporting the checkpoint's recent records");
            checkpoint.recent_records.clone()
        }
    };

    print!("{}", output::format(&checkpoint.metadata, &records, kind));
    Ok(())
}

fn handle_clear_checkpoint(config: &Config) -> anyhow::Result<()> {
    let mut store = open_checkpoint_store(config)?;
    store.clear()?;
    println!(
        "✓ Checkpoint '{}' cleared",
        config.checkpoint.session_key
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, fresh: bool) -> anyhow::Result<()> {
    let Some(source) = config.source.clone() else {
        bail!("no [source] section configured; nothing to crawl");
    };

    let mut store = open_checkpoint_store(&config)?;
    if fresh {
        tracing::info!("Starting fresh crawl (discarding stored checkpoint)");
        store.clear()?;
    }

    let accessor = HtmlPageAccessor::new(source)?;
    let export_kind = config.output.format;
    let export_path = output::export_path(Path::new(&config.output.path), export_kind);

    let mut orchestrator =
        CrawlOrchestrator::new(config, accessor, store).with_config_hash(config_hash);
    if !fresh && orchestrator.restore_from_store() {
        tracing::info!("Resuming interrupted crawl");
    }

    let handle = orchestrator.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current item");
            handle.stop();
        }
    });

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CrawlEvent::Stats {
                    jobs,
                    errors,
                    elapsed,
                }) => tracing::debug!(
                    "{} records, {} errors, {} elapsed",
                    jobs,
                    errors,
                    format_elapsed(elapsed)
                ),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let outcome = orchestrator.run().await.context("crawl failed")?;
    match &outcome {
        RunOutcome::Completed { caveat: None } => tracing::info!("Crawl completed successfully"),
        RunOutcome::Completed { caveat: Some(caveat) } => {
            tracing::warn!("Crawl completed with caveat: {}", caveat)
        }
        RunOutcome::Stopped => tracing::info!("Crawl stopped; run again to resume"),
    }

    let aggregator = orchestrator.aggregator();
    output::write_export(
        aggregator.metadata(),
        aggregator.records(),
        export_kind,
        &export_path,
    )?;
    println!(
        "✓ {} records exported to: {}",
        aggregator.admitted_count(),
        export_path.display()
    );

    Ok(())
}
