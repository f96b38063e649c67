//! Core data model.
//!
//! Tasks themselves are opaque strings; the queue never inspects them. What
//! the queue does track is which worker holds which tasks, and what each
//! sweep recovered.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Worker identity
// ---------------------------------------------------------------------------

/// Opaque identity of one worker process, unique for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Generate a fresh identity for a starting worker.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identity read back from the store or supplied by an operator.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Error::InvalidWorkerId(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Sweep results
// ---------------------------------------------------------------------------

/// Tasks moved back to the shared queues for one dead worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Recovery {
    pub active_requeued: usize,
    pub delayed_requeued: usize,
}

impl Recovery {
    pub fn total(&self) -> usize {
        self.active_requeued + self.delayed_requeued
    }
}

/// Summary of one successful sweep. Failed sweeps produce no report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Identities found in the worker set.
    pub workers_scanned: usize,
    /// Identities classified dead and recovered.
    pub workers_recovered: usize,
    pub active_requeued: usize,
    pub delayed_requeued: usize,
}

impl SweepReport {
    pub(crate) fn add_recovery(&mut self, recovery: &Recovery) {
        self.workers_recovered += 1;
        self.active_requeued += recovery.active_requeued;
        self.delayed_requeued += recovery.delayed_requeued;
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Operator view of one registered worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub id: WorkerId,
    /// Whether the heartbeat key is currently present.
    pub alive: bool,
    /// Value written by the last heartbeat (an RFC 3339 timestamp), if present.
    pub last_heartbeat: Option<String>,
    pub active_tasks: usize,
    pub delayed_tasks: usize,
}
