//! rq CLI: runs the cleaner and inspects the reliable queue.

use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use reliable_queue::cleaner::{Cleaner, Recover, Requeue, Sweep};
use reliable_queue::config::Config;
use reliable_queue::config::secrets::ExposeSecret;
use reliable_queue::error::Error;
use reliable_queue::inspect;
use reliable_queue::keys::Keyspace;
use reliable_queue::model::WorkerId;
use reliable_queue::queue;
use reliable_queue::shutdown::Shutdown;
use reliable_queue::store::{RedisStore, Store};
use reliable_queue::telemetry::{TelemetryConfig, init_telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "rq", about = "Reliable work queue maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the cleaner until interrupted
    Clean {
        /// Seconds between sweeps (overrides RQ_CLEAN_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run a single sweep and print what it recovered
    Sweep,
    /// List registered workers
    Workers {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Also print the tasks each worker holds
        #[arg(long)]
        tasks: bool,
    },
    /// Requeue a worker's claimed tasks and deregister it
    Requeue {
        /// Worker identity
        worker_id: String,
        /// Recover even if the worker's heartbeat is present
        #[arg(long)]
        force: bool,
    },
    /// Push a task payload onto the shared queue
    Enqueue {
        /// Opaque task payload
        payload: String,
        /// Push onto the delayed queue instead
        #[arg(long)]
        delayed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _telemetry = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "rq".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    let store = RedisStore::connect(config.redis_url.expose_secret())
        .await
        .context("connecting to redis")?;
    store.health_check().await?;
    let keyspace = config.keyspace();

    match cli.command {
        Command::Clean { interval } => {
            let mut cleaner_config = config.cleaner();
            if let Some(secs) = interval {
                if secs == 0 {
                    bail!("--interval must be greater than zero");
                }
                cleaner_config.interval = Duration::from_secs(secs);
            }
            cmd_clean(Cleaner::new(store, keyspace, cleaner_config)).await
        }
        Command::Sweep => {
            let cleaner = Cleaner::new(store, keyspace, config.cleaner());
            let report = cleaner.run_sweep().await?;
            println!(
                "scanned {} workers, recovered {} ({} active, {} delayed tasks requeued)",
                report.workers_scanned,
                report.workers_recovered,
                report.active_requeued,
                report.delayed_requeued
            );
            Ok(())
        }
        Command::Workers { json, tasks } => cmd_workers(&store, &keyspace, json, tasks).await,
        Command::Requeue { worker_id, force } => {
            cmd_requeue(store, &keyspace, worker_id, force).await
        }
        Command::Enqueue { payload, delayed } => {
            let depth = if delayed {
                queue::enqueue_delayed(&store, &keyspace, &payload).await?
            } else {
                queue::enqueue(&store, &keyspace, &payload).await?
            };
            println!("queued ({depth} waiting)");
            Ok(())
        }
    }
}

async fn cmd_clean<W: Sweep + 'static>(cleaner: Cleaner<W>) -> anyhow::Result<()> {
    let shutdown = Shutdown::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            signal.trigger();
        }
    });

    let handle = tokio::spawn(async move { cleaner.clean(&shutdown).await });
    match handle.await? {
        Error::Cancelled(reason) => {
            info!(%reason, "cleaner stopped");
            Ok(())
        }
        e => Err(e.into()),
    }
}

async fn cmd_workers(
    store: &RedisStore,
    keyspace: &Keyspace,
    json: bool,
    tasks: bool,
) -> anyhow::Result<()> {
    let workers = inspect::list_workers(store, keyspace).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workers)?);
        return Ok(());
    }

    if workers.is_empty() {
        println!("No registered workers.");
        return Ok(());
    }

    println!(
        "{:<38} {:<6} {:>6} {:>7}  LAST HEARTBEAT",
        "ID", "ALIVE", "ACTIVE", "DELAYED"
    );
    for w in &workers {
        println!(
            "{:<38} {:<6} {:>6} {:>7}  {}",
            w.id,
            if w.alive { "yes" } else { "no" },
            w.active_tasks,
            w.delayed_tasks,
            w.last_heartbeat.as_deref().unwrap_or("-")
        );
        if tasks {
            for task in inspect::held_tasks(store, keyspace, &w.id).await? {
                println!("    {task}");
            }
        }
    }
    println!("\n{} worker(s)", workers.len());
    Ok(())
}

async fn cmd_requeue(
    store: RedisStore,
    keyspace: &Keyspace,
    worker_id: String,
    force: bool,
) -> anyhow::Result<()> {
    let id = WorkerId::parse(worker_id)?;
    if !force && store.key_exists(&keyspace.heartbeat_key(&id)).await? {
        bail!("worker {id} is still heartbeating; pass --force to requeue anyway");
    }
    let recovery = Requeue::new(store).recover(&id, keyspace).await?;
    println!(
        "requeued {} active and {} delayed task(s) from {id}",
        recovery.active_requeued, recovery.delayed_requeued
    );
    Ok(())
}
