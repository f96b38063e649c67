//! Per-worker recovery: return a dead worker's claimed tasks to the shared
//! queues, then deregister it.

use opentelemetry::KeyValue;
use tracing::{Instrument, info};

use super::Recover;
use crate::error::Result;
use crate::keys::Keyspace;
use crate::model::{Recovery, WorkerId};
use crate::store::Store;
use crate::telemetry::metrics;
use crate::telemetry::sweep as spans;

#[derive(Debug, Clone)]
pub struct Requeue<S> {
    store: S,
}

impl<S: Store> Requeue<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Move every entry of `from` onto `to`, oldest first, so `to` receives
    /// them in the order they were claimed. Each move is atomic.
    async fn drain(&self, from: &str, to: &str) -> Result<usize> {
        let mut moved = 0;
        while self.store.move_oldest(from, to).await?.is_some() {
            moved += 1;
        }
        Ok(moved)
    }

    /// Hand every task `worker` holds back to the shared queues, then drop
    /// it from the worker set. Deregistration comes last: a worker still in
    /// the set is swept again if anything before it failed.
    ///
    /// Shared by dead-worker recovery and graceful deregistration; records
    /// no cleaner metrics.
    pub(crate) async fn return_tasks(
        &self,
        worker: &WorkerId,
        keyspace: &Keyspace,
    ) -> Result<Recovery> {
        let active_requeued = self
            .drain(
                &keyspace.worker_active_queue(worker),
                &keyspace.active_queue(),
            )
            .await?;
        let delayed_requeued = self
            .drain(
                &keyspace.worker_delayed_queue(worker),
                &keyspace.delayed_queue(),
            )
            .await?;
        self.store
            .remove_from_set(&keyspace.worker_set(), worker.as_str())
            .await?;
        Ok(Recovery {
            active_requeued,
            delayed_requeued,
        })
    }

    async fn recover_dead(&self, worker: &WorkerId, keyspace: &Keyspace) -> Result<Recovery> {
        let recovery = self.return_tasks(worker, keyspace).await?;

        metrics::workers_recovered().add(1, &[]);
        metrics::tasks_requeued().add(
            recovery.active_requeued as u64,
            &[KeyValue::new("queue", "active")],
        );
        metrics::tasks_requeued().add(
            recovery.delayed_requeued as u64,
            &[KeyValue::new("queue", "delayed")],
        );
        info!(
            active_requeued = recovery.active_requeued,
            delayed_requeued = recovery.delayed_requeued,
            "dead worker recovered"
        );
        Ok(recovery)
    }
}

impl<S: Store> Recover for Requeue<S> {
    async fn recover(&self, worker: &WorkerId, keyspace: &Keyspace) -> Result<Recovery> {
        self.recover_dead(worker, keyspace)
            .instrument(spans::start_recover_span(worker))
            .await
    }
}
