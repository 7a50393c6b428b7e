//! Observability (A3): metrics only — logging goes through `tracing`
//! directly at call sites via `#[instrument]` and explicit events, the same
//! division `ac-service::observability` draws between its `metrics` module
//! and ad hoc `tracing` calls elsewhere.

pub mod metrics;
