//! Key naming shared by workers and the cleaner.
//!
//! Every per-worker key is `{namespace}:worker:{id}:{kind}` with a distinct
//! fixed suffix per kind, so two different identities can never map to the
//! same key, and no per-worker key can equal a shared one.

use crate::model::WorkerId;

pub const DEFAULT_NAMESPACE: &str = "rq";

const HEARTBEAT_SUFFIX: &str = "heartbeat";
const ACTIVE_SUFFIX: &str = "active";
const DELAYED_SUFFIX: &str = "delayed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    namespace: String,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl Keyspace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Set of registered worker identities.
    pub fn worker_set(&self) -> String {
        format!("{}:workers", self.namespace)
    }

    pub fn active_queue(&self) -> String {
        format!("{}:queue:active", self.namespace)
    }

    pub fn delayed_queue(&self) -> String {
        format!("{}:queue:delayed", self.namespace)
    }

    pub fn heartbeat_key(&self, worker: &WorkerId) -> String {
        self.worker_key(worker, HEARTBEAT_SUFFIX)
    }

    pub fn worker_active_queue(&self, worker: &WorkerId) -> String {
        self.worker_key(worker, ACTIVE_SUFFIX)
    }

    pub fn worker_delayed_queue(&self, worker: &WorkerId) -> String {
        self.worker_key(worker, DELAYED_SUFFIX)
    }

    fn worker_key(&self, worker: &WorkerId, suffix: &str) -> String {
        format!("{}:worker:{}:{}", self.namespace, worker, suffix)
    }
}
