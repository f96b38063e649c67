//! Worker side of the protocol: registration, heartbeats, and claiming tasks
//! into a per-worker queue.
//!
//! The execute loop itself belongs to the application. A worker that stops
//! heartbeating is found by the cleaner, which requeues whatever it still
//! held.

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cleaner::Requeue;
use crate::error::{Error, Result};
use crate::keys::Keyspace;
use crate::model::{Recovery, WorkerId};
use crate::shutdown::Shutdown;
use crate::store::Store;
use crate::telemetry::metrics;

/// Heartbeat cadence. `ttl` is the refresh interval plus the grace period a
/// worker gets before the cleaner may consider it dead.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub ttl: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            ttl: Duration::from_secs(30),
        }
    }
}

/// A registered worker.
pub struct WorkerSession<S> {
    id: WorkerId,
    store: S,
    keyspace: Keyspace,
    heartbeat: HeartbeatConfig,
}

impl<S: Store> WorkerSession<S> {
    /// Register a worker under a freshly generated identity.
    pub async fn register(
        store: S,
        keyspace: Keyspace,
        heartbeat: HeartbeatConfig,
    ) -> Result<Self> {
        Self::register_as(WorkerId::generate(), store, keyspace, heartbeat).await
    }

    /// Register a worker under a caller-chosen identity.
    ///
    /// Registration is the first [`beat`](Self::beat).
    pub async fn register_as(
        id: WorkerId,
        store: S,
        keyspace: Keyspace,
        heartbeat: HeartbeatConfig,
    ) -> Result<Self> {
        let session = Self {
            id,
            store,
            keyspace,
            heartbeat,
        };
        session.beat().await?;
        info!(worker = %session.id, "worker registered");
        Ok(session)
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Refresh the heartbeat key, then make sure this worker is in the
    /// worker set.
    ///
    /// The heartbeat is written first, so a member of the set is never
    /// observed without one. Re-adding is idempotent and restores a worker
    /// that a sweep removed while its heartbeat had lapsed.
    pub async fn beat(&self) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.store
            .set_with_expiry(
                &self.keyspace.heartbeat_key(&self.id),
                &now,
                self.heartbeat.ttl,
            )
            .await?;
        self.store
            .add_to_set(&self.keyspace.worker_set(), self.id.as_str())
            .await?;
        metrics::heartbeats().add(1, &[]);
        debug!(worker = %self.id, "heartbeat");
        Ok(())
    }

    /// Beat on every interval until `shutdown` fires (`Ok`) or a write fails.
    pub async fn run_heartbeat(&self, shutdown: &Shutdown) -> Result<()> {
        if self.heartbeat.interval.is_zero() {
            return Err(Error::Config(
                "heartbeat interval must be greater than zero".to_string(),
            ));
        }
        let mut ticker = tokio::time::interval(self.heartbeat.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => return Ok(()),
                _ = ticker.tick() => {}
            }
            if let Err(e) = self.beat().await {
                warn!(worker = %self.id, error = %e, "heartbeat failed");
                return Err(e);
            }
        }
    }

    /// Claim the oldest task on the shared active queue.
    pub async fn claim(&self) -> Result<Option<String>> {
        self.store
            .move_oldest(
                &self.keyspace.active_queue(),
                &self.keyspace.worker_active_queue(&self.id),
            )
            .await
    }

    /// Claim the oldest task on the shared delayed queue.
    pub async fn claim_delayed(&self) -> Result<Option<String>> {
        self.store
            .move_oldest(
                &self.keyspace.delayed_queue(),
                &self.keyspace.worker_delayed_queue(&self.id),
            )
            .await
    }

    /// Drop a finished task from this worker's queues.
    ///
    /// Returns `false` if the task is no longer held. That happens when a
    /// cleaner requeued it during a missed heartbeat; there is nothing left
    /// to do and it is not an error.
    pub async fn complete(&self, task: &str) -> Result<bool> {
        let active = self.keyspace.worker_active_queue(&self.id);
        if self.store.remove_from_list(&active, task).await? > 0 {
            return Ok(true);
        }
        let delayed = self.keyspace.worker_delayed_queue(&self.id);
        let removed = self.store.remove_from_list(&delayed, task).await? > 0;
        if !removed {
            debug!(worker = %self.id, "completed task had already been requeued");
        }
        Ok(removed)
    }

    /// Graceful shutdown: hand back any held tasks, then remove every trace
    /// of this worker.
    pub async fn deregister(self) -> Result<Recovery> {
        let recovery = Requeue::new(self.store.clone())
            .return_tasks(&self.id, &self.keyspace)
            .await?;
        self.store
            .delete(&self.keyspace.heartbeat_key(&self.id))
            .await?;
        info!(
            worker = %self.id,
            returned = recovery.total(),
            "worker deregistered"
        );
        Ok(recovery)
    }
}
