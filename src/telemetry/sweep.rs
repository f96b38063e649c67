//! Cleaner span helpers.
//!
//! One span per sweep, with a child span per recovered worker.

use tracing::Span;

use crate::model::{SweepReport, WorkerId};

/// Start a span for one sweep.
///
/// The result fields are declared empty and filled by [`record_report`].
pub fn start_sweep_span(namespace: &str) -> Span {
    tracing::info_span!(
        "cleaner.sweep",
        "rq.namespace" = namespace,
        "rq.workers_scanned" = tracing::field::Empty,
        "rq.workers_recovered" = tracing::field::Empty,
        "rq.tasks_requeued" = tracing::field::Empty,
    )
}

pub fn record_report(span: &Span, report: &SweepReport) {
    span.record("rq.workers_scanned", report.workers_scanned);
    span.record("rq.workers_recovered", report.workers_recovered);
    span.record(
        "rq.tasks_requeued",
        report.active_requeued + report.delayed_requeued,
    );
}

/// Start a span for recovering one dead worker.
pub fn start_recover_span(worker: &WorkerId) -> Span {
    tracing::info_span!("cleaner.recover", "rq.worker" = %worker)
}
