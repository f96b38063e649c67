//! Metric instrument factories for reliable-queue.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"reliable-queue"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for reliable-queue instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("reliable-queue")
}

/// Counter: completed sweeps.
/// Labels: `result` ("ok" | "error").
pub fn sweeps() -> Counter<u64> {
    meter()
        .u64_counter("rq.cleaner.sweeps")
        .with_description("Number of dead-worker sweeps")
        .build()
}

/// Counter: workers classified dead and recovered.
pub fn workers_recovered() -> Counter<u64> {
    meter()
        .u64_counter("rq.cleaner.workers_recovered")
        .with_description("Number of dead workers recovered by the cleaner")
        .build()
}

/// Counter: orphaned tasks moved back to a shared queue.
/// Labels: `queue` ("active" | "delayed").
pub fn tasks_requeued() -> Counter<u64> {
    meter()
        .u64_counter("rq.cleaner.tasks_requeued")
        .with_description("Number of orphaned tasks requeued")
        .build()
}

/// Histogram: sweep duration in milliseconds.
pub fn sweep_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("rq.cleaner.sweep_duration_ms")
        .with_description("Sweep duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: store round-trips.
/// Labels: `operation` (the Redis command).
pub fn store_operations() -> Counter<u64> {
    meter()
        .u64_counter("rq.store.operations")
        .with_description("Number of store operations")
        .build()
}

/// Counter: heartbeats written by workers in this process.
pub fn heartbeats() -> Counter<u64> {
    meter()
        .u64_counter("rq.worker.heartbeats")
        .with_description("Number of worker heartbeats written")
        .build()
}
