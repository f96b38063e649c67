//! Dead-worker scan over the registered worker set.

use tracing::debug;

use super::{Recover, Sweep};
use crate::error::Result;
use crate::keys::Keyspace;
use crate::model::{SweepReport, WorkerId};
use crate::store::Store;

/// Classifies every registered worker by its heartbeat key and hands the
/// dead ones to `R`.
///
/// The first store or recovery error aborts the scan; workers not yet
/// visited are left for the next sweep.
#[derive(Debug, Clone)]
pub struct DeadWorkerScan<S, R> {
    store: S,
    recover: R,
}

impl<S, R> DeadWorkerScan<S, R> {
    pub fn new(store: S, recover: R) -> Self {
        Self { store, recover }
    }
}

impl<S: Store, R: Recover> Sweep for DeadWorkerScan<S, R> {
    async fn sweep(&self, keyspace: &Keyspace) -> Result<SweepReport> {
        let members = self.store.set_members(&keyspace.worker_set()).await?;
        let mut report = SweepReport {
            workers_scanned: members.len(),
            ..SweepReport::default()
        };

        for member in members {
            let worker = WorkerId::parse(member)?;
            if self.store.key_exists(&keyspace.heartbeat_key(&worker)).await? {
                debug!(%worker, "worker alive");
                continue;
            }
            let recovery = self.recover.recover(&worker, keyspace).await?;
            report.add_recovery(&recovery);
        }

        Ok(report)
    }
}
