//! Producer helpers for the shared queues. Payloads are opaque.

use crate::error::Result;
use crate::keys::Keyspace;
use crate::store::Store;

/// Push a task onto the shared active queue. Returns the new queue depth.
pub async fn enqueue<S: Store>(store: &S, keyspace: &Keyspace, task: &str) -> Result<usize> {
    store.push(&keyspace.active_queue(), task).await
}

/// Push a task onto the shared delayed queue. Returns the new queue depth.
pub async fn enqueue_delayed<S: Store>(
    store: &S,
    keyspace: &Keyspace,
    task: &str,
) -> Result<usize> {
    store.push(&keyspace.delayed_queue(), task).await
}
