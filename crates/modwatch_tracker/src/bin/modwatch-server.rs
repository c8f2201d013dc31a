//! modwatch server - polls the catalog and notifies subscribed guilds.

use clap::Parser;
use modwatch_cache::CatalogCache;
use modwatch_catalog::{BatchFetcher, CachedCatalog, ModrinthClient};
use modwatch_database::{InMemoryTrackerStore, PgTrackerStore, establish_pool};
use modwatch_interface::{CatalogClient, Messenger, TrackerStore};
use modwatch_social::DiscordMessenger;
use modwatch_tracker::{
    CycleScheduler, DetectionCycle, DispatchMode, DispatchSink, ModwatchConfig,
    NotificationDispatcher, init_tracing, notification_queue,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "modwatch-server")]
#[command(about = "Tracks catalog projects and announces new versions on Discord")]
#[command(version)]
struct Args {
    /// Configuration file layered over the bundled defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, default_value_t = 8)]
    pool_size: u32,

    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    discord_token: String,

    /// Keep tracking state in memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = ModwatchConfig::load(args.config.as_deref())?;
    init_tracing(config.log())?;
    info!(
        poll_interval_minutes = config.poll_interval_minutes(),
        batch_size = config.version_batch_size(),
        dispatch_mode = %config.dispatch_mode(),
        "Starting modwatch server"
    );

    let store: Arc<dyn TrackerStore> = if args.in_memory {
        warn!("Using in-memory store, tracking state will not survive restarts");
        Arc::new(InMemoryTrackerStore::new())
    } else {
        let url = args
            .database_url
            .as_deref()
            .ok_or("DATABASE_URL not provided (use --in-memory for a dry run)")?;
        Arc::new(PgTrackerStore::new(establish_pool(url, args.pool_size)?))
    };

    let client: Arc<dyn CatalogClient> = Arc::new(ModrinthClient::new(config.catalog())?);
    let cache = Arc::new(CatalogCache::new(config.cache_policy()));
    let messenger: Arc<dyn Messenger> = Arc::new(DiscordMessenger::new(&args.discord_token));
    let dispatcher = NotificationDispatcher::new(messenger, Arc::clone(&store));

    let mut cycle = DetectionCycle::new(
        BatchFetcher::new(Arc::clone(&client), *config.version_batch_size()),
        Arc::clone(&store),
        dispatcher.clone(),
    )
    .with_cache(CachedCatalog::new(client, cache))
    .with_max_concurrent_projects(*config.max_concurrent_projects())
    .with_deadline(config.cycle_deadline());

    let worker = match config.dispatch_mode() {
        DispatchMode::Inline => None,
        DispatchMode::Queued => {
            let (queue, worker) = notification_queue(dispatcher, *config.queue_capacity());
            cycle = cycle.with_sink(DispatchSink::Queued(queue));
            Some(tokio::spawn(worker.run()))
        }
    };

    let scheduler = CycleScheduler::new(cycle, config.poll_interval());

    if args.once {
        match scheduler.run_once().await {
            Some(Ok(report)) => info!(?report, "Single cycle finished"),
            Some(Err(e)) => return Err(e.into()),
            None => warn!("A cycle was already running"),
        }
    } else {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C, stopping");
            }
        };
        scheduler.run(shutdown).await;
        if scheduler.is_running() {
            info!("Waiting for the in-flight cycle to finish");
        }
        scheduler.wait_idle().await;
    }

    // Dropping the scheduler closes the queue so the worker can drain and stop.
    drop(scheduler);
    if let Some(worker) = worker {
        worker.await?;
    }

    info!("modwatch server stopped");
    Ok(())
}
