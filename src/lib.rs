//! # reliable-queue
//!
//! Redis-backed reliable work queue.
//!
//! Workers claim tasks into a queue scoped to their own identity and keep a
//! heartbeat key alive while they run. The [`cleaner::Cleaner`] sweeps the
//! registered workers, and any worker whose heartbeat has expired gets its
//! claimed tasks pushed back onto the shared queues, so a crashed worker
//! never loses work.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod inspect;
pub mod keys;
pub mod model;
pub mod queue;
pub mod shutdown;
pub mod store;
pub mod telemetry;
pub mod worker;
