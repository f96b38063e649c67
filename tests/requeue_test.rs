//! Tests for recovering dead workers' tasks, alone and through a full
//! cleaner sweep.

use std::time::Duration;

use reliable_queue::cleaner::{Cleaner, CleanerConfig, Recover, Requeue};
use reliable_queue::keys::Keyspace;
use reliable_queue::model::WorkerId;
use reliable_queue::store::{MemoryStore, Store};
use uuid::Uuid;

fn disposable_keyspace() -> Keyspace {
    Keyspace::new(format!("test-{}", Uuid::new_v4()))
}

/// Register a worker holding `tasks`, claimed in the given order.
async fn worker_holding(
    store: &MemoryStore,
    keys: &Keyspace,
    tasks: &[&str],
    alive: bool,
) -> WorkerId {
    let id = WorkerId::generate();
    store.add_to_set(&keys.worker_set(), id.as_str()).await.unwrap();
    for task in tasks {
        store
            .push(&keys.worker_active_queue(&id), task)
            .await
            .unwrap();
    }
    if alive {
        store
            .set_with_expiry(&keys.heartbeat_key(&id), "alive", Duration::from_secs(60))
            .await
            .unwrap();
    }
    id
}

#[tokio::test]
async fn requeue_moves_all_tasks_and_deregisters() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    let id = worker_holding(&store, &keys, &["t1", "t2", "t3", "t4", "t5"], false).await;
    let held_before = store.list_items(&keys.worker_active_queue(&id)).await.unwrap();

    let recovery = Requeue::new(store.clone()).recover(&id, &keys).await.unwrap();

    assert_eq!(recovery.active_requeued, 5);
    assert_eq!(recovery.delayed_requeued, 0);
    assert_eq!(store.list_len(&keys.worker_active_queue(&id)).await.unwrap(), 0);
    // Same relative order as the worker held them.
    assert_eq!(store.list_items(&keys.active_queue()).await.unwrap(), held_before);
    assert!(store.set_members(&keys.worker_set()).await.unwrap().is_empty());
}

#[tokio::test]
async fn requeued_tasks_are_consumed_in_claim_order() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    store.push(&keys.active_queue(), "waiting").await.unwrap();
    let id = worker_holding(&store, &keys, &["first", "second"], false).await;

    Requeue::new(store.clone()).recover(&id, &keys).await.unwrap();

    let mut consumed = Vec::new();
    while let Some(task) = store
        .move_oldest(&keys.active_queue(), "consumer")
        .await
        .unwrap()
    {
        consumed.push(task);
    }
    assert_eq!(consumed, ["waiting", "first", "second"]);
}

#[tokio::test]
async fn requeue_of_empty_worker_only_deregisters() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    let id = worker_holding(&store, &keys, &[], false).await;

    let recovery = Requeue::new(store.clone()).recover(&id, &keys).await.unwrap();

    assert_eq!(recovery.total(), 0);
    assert!(!store.key_exists(&keys.active_queue()).await.unwrap());
    assert!(!store.key_exists(&keys.delayed_queue()).await.unwrap());
    assert!(store.set_members(&keys.worker_set()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delayed_tasks_return_to_the_delayed_queue() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    let id = worker_holding(&store, &keys, &["now"], false).await;
    store
        .push(&keys.worker_delayed_queue(&id), "later")
        .await
        .unwrap();

    let recovery = Requeue::new(store.clone()).recover(&id, &keys).await.unwrap();

    assert_eq!(recovery.active_requeued, 1);
    assert_eq!(recovery.delayed_requeued, 1);
    assert_eq!(store.list_items(&keys.active_queue()).await.unwrap(), ["now"]);
    assert_eq!(store.list_items(&keys.delayed_queue()).await.unwrap(), ["later"]);
}

#[tokio::test]
async fn cleaner_sweep_recovers_dead_and_spares_live_workers() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    let live = worker_holding(&store, &keys, &["live-1", "live-2"], true).await;
    let dead = worker_holding(&store, &keys, &["a", "b", "c", "d", "e"], false).await;
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());

    let report = cleaner.run_sweep().await.unwrap();

    assert_eq!(report.workers_scanned, 2);
    assert_eq!(report.workers_recovered, 1);
    assert_eq!(report.active_requeued, 5);
    assert_eq!(store.list_len(&keys.active_queue()).await.unwrap(), 5);
    assert_eq!(store.list_len(&keys.worker_active_queue(&dead)).await.unwrap(), 0);
    assert_eq!(
        store.list_items(&keys.worker_active_queue(&live)).await.unwrap(),
        ["live-2", "live-1"]
    );
    assert_eq!(
        store.set_members(&keys.worker_set()).await.unwrap(),
        vec![live.to_string()]
    );
}

#[tokio::test]
async fn five_dead_idle_workers_are_all_deregistered() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    for _ in 0..5 {
        worker_holding(&store, &keys, &[], false).await;
    }
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());

    let report = cleaner.run_sweep().await.unwrap();

    assert_eq!(report.workers_recovered, 5);
    assert_eq!(report.active_requeued, 0);
    assert!(store.set_members(&keys.worker_set()).await.unwrap().is_empty());
    assert_eq!(store.list_len(&keys.active_queue()).await.unwrap(), 0);
}

#[tokio::test]
async fn repeated_sweeps_are_idempotent() {
    let store = MemoryStore::new();
    let keys = disposable_keyspace();
    worker_holding(&store, &keys, &["x"], false).await;
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());

    let first = cleaner.run_sweep().await.unwrap();
    let second = cleaner.run_sweep().await.unwrap();

    assert_eq!(first.workers_recovered, 1);
    assert_eq!(second.workers_scanned, 0);
    assert_eq!(second.workers_recovered, 0);
    assert_eq!(store.list_items(&keys.active_queue()).await.unwrap(), ["x"]);
}
