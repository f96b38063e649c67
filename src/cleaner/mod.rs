//! The cleaner: finds workers whose heartbeat has lapsed and puts the work
//! they had claimed back on the shared queues.
//!
//! A [`Cleaner`] is a loop around one [`Sweep`]. The production sweep is a
//! [`DeadWorkerScan`] that hands each dead worker to a [`Recover`] step,
//! normally [`Requeue`]. Both steps are traits so either can be replaced
//! when the cleaner is constructed.

pub mod requeue;
pub mod scan;

use std::future::Future;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, error, info};

use crate::error::{Error, Result};
use crate::keys::Keyspace;
use crate::model::{Recovery, SweepReport, WorkerId};
use crate::shutdown::Shutdown;
use crate::store::Store;
use crate::telemetry::metrics;
use crate::telemetry::sweep as spans;

pub use requeue::Requeue;
pub use scan::DeadWorkerScan;

/// One pass over the worker set.
pub trait Sweep: Send + Sync {
    fn sweep(&self, keyspace: &Keyspace) -> impl Future<Output = Result<SweepReport>> + Send;
}

/// Recovery of a single worker already classified dead.
pub trait Recover: Send + Sync {
    fn recover(
        &self,
        worker: &WorkerId,
        keyspace: &Keyspace,
    ) -> impl Future<Output = Result<Recovery>> + Send;
}

/// Configuration for the cleaner loop.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Time between the start of consecutive sweeps.
    pub interval: Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

pub struct Cleaner<W> {
    sweep: W,
    keyspace: Keyspace,
    config: CleanerConfig,
}

impl<S: Store> Cleaner<DeadWorkerScan<S, Requeue<S>>> {
    /// A cleaner that scans for dead workers in `store` and requeues their
    /// tasks.
    pub fn new(store: S, keyspace: Keyspace, config: CleanerConfig) -> Self {
        let requeue = Requeue::new(store.clone());
        Self::with_sweep(DeadWorkerScan::new(store, requeue), keyspace, config)
    }
}

impl<W: Sweep> Cleaner<W> {
    pub fn with_sweep(sweep: W, keyspace: Keyspace, config: CleanerConfig) -> Self {
        Self {
            sweep,
            keyspace,
            config,
        }
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Run one sweep and record its outcome.
    pub async fn run_sweep(&self) -> Result<SweepReport> {
        let span = spans::start_sweep_span(self.keyspace.namespace());
        let started = Instant::now();

        let result = self
            .sweep
            .sweep(&self.keyspace)
            .instrument(span.clone())
            .await;

        metrics::sweep_duration_ms().record(started.elapsed().as_secs_f64() * 1000.0, &[]);
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::sweeps().add(1, &[KeyValue::new("result", outcome)]);

        if let Ok(ref report) = result {
            spans::record_report(&span, report);
            if report.workers_recovered > 0 {
                info!(
                    parent: &span,
                    workers_recovered = report.workers_recovered,
                    active_requeued = report.active_requeued,
                    delayed_requeued = report.delayed_requeued,
                    "sweep recovered dead workers"
                );
            }
        }
        result
    }

    /// Sweep on every tick until `shutdown` fires or a sweep fails.
    ///
    /// This only ever returns an error: [`Error::Cancelled`] carrying the
    /// shutdown reason, or [`Error::Cleaning`] wrapping the sweep failure
    /// ([`Error::Config`] for a zero interval). A shutdown that has already
    /// fired returns before any sweep runs. A sweep in progress is never
    /// interrupted.
    pub async fn clean(&self, shutdown: &Shutdown) -> Error {
        if let Some(reason) = shutdown.reason() {
            return Error::Cancelled(reason);
        }
        if self.config.interval.is_zero() {
            return Error::Config("cleaner interval must be greater than zero".to_string());
        }

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            namespace = self.keyspace.namespace(),
            interval_secs = self.config.interval.as_secs_f64(),
            "cleaner started"
        );

        loop {
            tokio::select! {
                biased;
                reason = shutdown.wait() => {
                    info!(%reason, "cleaner stopping");
                    return Error::Cancelled(reason);
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.run_sweep().await {
                error!(error = %e, "sweep failed, cleaner exiting");
                return Error::Cleaning(Box::new(e));
            }
        }
    }
}
