//! Occurrence calculation (C3) and binding (C6).

pub mod binder;
pub mod calculator;

pub use binder::bind;
pub use calculator::{occurrences_from_date, occurrences_from_start};
