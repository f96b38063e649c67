//! Read-only views of worker state for operators.

use crate::error::Result;
use crate::keys::Keyspace;
use crate::model::{WorkerId, WorkerStatus};
use crate::store::Store;

/// Status of every registered worker, sorted by id.
pub async fn list_workers<S: Store>(store: &S, keyspace: &Keyspace) -> Result<Vec<WorkerStatus>> {
    let mut ids = store
        .set_members(&keyspace.worker_set())
        .await?
        .into_iter()
        .map(WorkerId::parse)
        .collect::<Result<Vec<_>>>()?;
    ids.sort();

    let mut statuses = Vec::with_capacity(ids.len());
    for id in ids {
        statuses.push(worker_status(store, keyspace, id).await?);
    }
    Ok(statuses)
}

pub async fn worker_status<S: Store>(
    store: &S,
    keyspace: &Keyspace,
    id: WorkerId,
) -> Result<WorkerStatus> {
    let last_heartbeat = store.get(&keyspace.heartbeat_key(&id)).await?;
    Ok(WorkerStatus {
        alive: last_heartbeat.is_some(),
        last_heartbeat,
        active_tasks: store.list_len(&keyspace.worker_active_queue(&id)).await?,
        delayed_tasks: store.list_len(&keyspace.worker_delayed_queue(&id)).await?,
        id,
    })
}

/// Tasks a worker currently holds in its active queue, oldest last.
pub async fn held_tasks<S: Store>(
    store: &S,
    keyspace: &Keyspace,
    id: &WorkerId,
) -> Result<Vec<String>> {
    store.list_items(&keyspace.worker_active_queue(id)).await
}
