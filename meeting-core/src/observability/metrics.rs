//! Metric definitions for the meeting core (A3), mirroring the
//! `meeting_core_` naming and bounded-cardinality discipline of
//! `ac-service::observability::metrics`.
//!
//! # Cardinality
//!
//! - `subject`: bounded by the fixed pub/sub subject list
//! - `outcome`: {handled, unknown_subject, not_ready, error}
//! - `effect`: {index, access, email, webhook}
//! - `aggregate`: bounded by the entity set

use metrics::counter;

/// Metric: `meeting_core_dispatch_total`
/// Labels: `subject`, `outcome` (handled, unknown_subject, not_ready, error)
pub fn record_dispatch(subject: &str, outcome: &str) {
    counter!("meeting_core_dispatch_total", "subject" => subject.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

/// Metric: `meeting_core_fanout_total`
/// Labels: `effect` (index, access, email, webhook), `outcome` (ok, error)
pub fn record_fanout(effect: &str, outcome: &str) {
    counter!("meeting_core_fanout_total", "effect" => effect.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

/// Metric: `meeting_core_conflict_retries_total`
/// Labels: `aggregate`
pub fn record_conflict_retry(aggregate: &str) {
    counter!("meeting_core_conflict_retries_total", "aggregate" => aggregate.to_string()).increment(1);
}

/// Metric: `meeting_core_occurrence_bind_total`
/// Labels: `outcome` (exact, nearest, fallback)
pub fn record_occurrence_bind(outcome: &str) {
    counter!("meeting_core_occurrence_bind_total", "outcome" => outcome.to_string()).increment(1);
}
