//! The cleaner and worker protocol against a live Redis.
//!
//! Every test uses a disposable namespace so runs never interfere.
//! Run with:
//! ```sh
//! cargo test --test redis_test -- --ignored
//! ```

use std::time::Duration;

use reliable_queue::cleaner::{Cleaner, CleanerConfig, Recover, Requeue};
use reliable_queue::error::Error;
use reliable_queue::keys::Keyspace;
use reliable_queue::model::WorkerId;
use reliable_queue::queue;
use reliable_queue::shutdown::{Shutdown, ShutdownReason};
use reliable_queue::store::{RedisStore, Store};
use reliable_queue::worker::{HeartbeatConfig, WorkerSession};
use uuid::Uuid;

/// Helper: connect for tests.
/// Requires REDIS_URL env var or defaults to local dev.
async fn test_store() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let store = RedisStore::connect(&url).await.unwrap();
    store.health_check().await.unwrap();
    store
}

fn disposable_keyspace() -> Keyspace {
    Keyspace::new(format!("rq-test-{}", Uuid::new_v4()))
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn sweep_recovers_dead_workers() {
    let store = test_store().await;
    let keys = disposable_keyspace();
    for _ in 0..5 {
        let id = WorkerId::generate();
        store.add_to_set(&keys.worker_set(), id.as_str()).await.unwrap();
    }
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());

    let report = cleaner.run_sweep().await.unwrap();

    assert_eq!(report.workers_recovered, 5);
    assert!(store.set_members(&keys.worker_set()).await.unwrap().is_empty());
    assert_eq!(store.list_len(&keys.active_queue()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn sweep_does_not_touch_live_workers() {
    let store = test_store().await;
    let keys = disposable_keyspace();
    for _ in 0..5 {
        let id = WorkerId::generate();
        store.add_to_set(&keys.worker_set(), id.as_str()).await.unwrap();
        store
            .set_with_expiry(&keys.heartbeat_key(&id), "alive", Duration::from_secs(60))
            .await
            .unwrap();
    }
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());

    let report = cleaner.run_sweep().await.unwrap();

    assert_eq!(report.workers_recovered, 0);
    assert_eq!(store.set_members(&keys.worker_set()).await.unwrap().len(), 5);
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn requeue_moves_worker_queue_to_shared_queue() {
    let store = test_store().await;
    let keys = disposable_keyspace();
    let id = WorkerId::generate();
    for _ in 0..5 {
        store
            .push(&keys.worker_active_queue(&id), "foo")
            .await
            .unwrap();
    }

    let recovery = Requeue::new(store.clone()).recover(&id, &keys).await.unwrap();

    assert_eq!(recovery.active_requeued, 5);
    assert_eq!(store.list_len(&keys.active_queue()).await.unwrap(), 5);
    assert_eq!(store.list_len(&keys.worker_active_queue(&id)).await.unwrap(), 0);
    store.delete(&keys.active_queue()).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn heartbeat_expiry_hands_work_back() {
    let store = test_store().await;
    let keys = disposable_keyspace();
    queue::enqueue(&store, &keys, "job").await.unwrap();
    let worker = WorkerSession::register(
        store.clone(),
        keys.clone(),
        HeartbeatConfig {
            interval: Duration::from_millis(200),
            ttl: Duration::from_millis(500),
        },
    )
    .await
    .unwrap();
    assert_eq!(worker.claim().await.unwrap().as_deref(), Some("job"));

    tokio::time::sleep(Duration::from_millis(800)).await;
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());
    let report = cleaner.run_sweep().await.unwrap();

    assert_eq!(report.active_requeued, 1);
    assert!(!worker.complete("job").await.unwrap());
    assert_eq!(store.list_items(&keys.active_queue()).await.unwrap(), ["job"]);
    store.delete(&keys.active_queue()).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn clean_blocks_until_deadline() {
    let store = test_store().await;
    let keys = disposable_keyspace();
    let cleaner = Cleaner::new(
        store,
        keys,
        CleanerConfig {
            interval: Duration::from_millis(100),
        },
    );

    let err = cleaner
        .clean(&Shutdown::with_timeout(Duration::from_secs(1)))
        .await;

    assert!(matches!(err, Error::Cancelled(ShutdownReason::DeadlineElapsed)));
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn wrong_key_type_fails_the_sweep() {
    let store = test_store().await;
    let keys = disposable_keyspace();
    store.push(&keys.worker_set(), "oops").await.unwrap();
    let cleaner = Cleaner::new(store.clone(), keys.clone(), CleanerConfig::default());

    let err = cleaner
        .clean(&Shutdown::with_timeout(Duration::from_secs(5)))
        .await;

    assert!(matches!(err, Error::Cleaning(ref cause) if matches!(**cause, Error::Store(_))));
    store.delete(&keys.worker_set()).await.unwrap();
}
