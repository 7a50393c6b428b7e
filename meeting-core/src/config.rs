//! Runtime configuration for the meeting core (A1).
//!
//! Loaded from environment variables with sensible defaults, the same way
//! `global-controller::config::Config` is loaded: a `from_env` entry point
//! delegates to a `HashMap`-based `from_vars` so tests never touch real
//! process environment.

use std::collections::HashMap;
use std::env;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Default bounded-concurrency worker pool size (C1).
pub const DEFAULT_WORKER_POOL_SIZE: usize = 8;

/// Default timeout for request-reply external lookups (C5), in milliseconds.
pub const DEFAULT_EXTERNAL_LOOKUP_TIMEOUT_MS: u64 = 5_000;

/// Default occurrence-binder search window, in days (C6 step 2's "1 month").
pub const DEFAULT_OCCURRENCE_SEARCH_WINDOW_DAYS: i64 = 30;

/// Default occurrence-binder candidate cap (C6 step 2).
pub const DEFAULT_OCCURRENCE_CANDIDATE_LIMIT: usize = 100;

/// Default number of retries on a revision conflict (§7: "at most one retry").
pub const DEFAULT_CONFLICT_RETRY_LIMIT: u32 = 1;

/// Configuration for the meeting core engine.
///
/// Carries no secrets today, but `Debug` is still hand-rolled (rather than
/// derived) so that a future credential field cannot leak into logs by
/// accident — the same discipline `global-controller::Config` applies to
/// `database_url`.
#[derive(Clone)]
pub struct CoreConfig {
    /// Concurrency bound for worker-pool fan-out (C1). Clamped to >= 1.
    pub worker_pool_size: usize,
    /// Timeout for request-reply external lookups (C5), in milliseconds.
    pub external_lookup_timeout_ms: u64,
    /// How far back from the actual start time the occurrence binder searches (C6).
    pub occurrence_binder_search_window_days: i64,
    /// Maximum occurrences the binder considers before falling back (C6).
    pub occurrence_binder_candidate_limit: usize,
    /// Maximum retries on a revision conflict for a single logical effect (§7).
    pub conflict_retry_limit: u32,
    /// Identifier for this core instance, used in logs and metrics.
    pub instance_id: String,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("worker_pool_size", &self.worker_pool_size)
            .field(
                "external_lookup_timeout_ms",
                &self.external_lookup_timeout_ms,
            )
            .field(
                "occurrence_binder_search_window_days",
                &self.occurrence_binder_search_window_days,
            )
            .field(
                "occurrence_binder_candidate_limit",
                &self.occurrence_binder_candidate_limit,
            )
            .field("conflict_retry_limit", &self.conflict_retry_limit)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid worker pool size: {0}")]
    InvalidWorkerPoolSize(String),

    #[error("invalid external lookup timeout: {0}")]
    InvalidExternalLookupTimeout(String),

    #[error("invalid occurrence binder search window: {0}")]
    InvalidSearchWindow(String),

    #[error("invalid occurrence binder candidate limit: {0}")]
    InvalidCandidateLimit(String),

    #[error("invalid conflict retry limit: {0}")]
    InvalidConflictRetryLimit(String),
}

impl CoreConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map (the seam used by tests).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let worker_pool_size = match vars.get("MEETING_CORE_WORKER_POOL_SIZE") {
            Some(raw) => {
                let value: usize = raw.parse().map_err(|_| {
                    ConfigError::InvalidWorkerPoolSize(format!(
                        "must be a positive integer, got '{raw}'"
                    ))
                })?;
                // C1: "clamped to >= 1" — zero is accepted and silently raised to 1.
                value.max(1)
            }
            None => DEFAULT_WORKER_POOL_SIZE,
        };

        let external_lookup_timeout_ms = match vars.get("MEETING_CORE_EXTERNAL_LOOKUP_TIMEOUT_MS")
        {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidExternalLookupTimeout(format!(
                    "must be a positive integer, got '{raw}'"
                ))
            })?,
            None => DEFAULT_EXTERNAL_LOOKUP_TIMEOUT_MS,
        };

        let occurrence_binder_search_window_days =
            match vars.get("MEETING_CORE_OCCURRENCE_SEARCH_WINDOW_DAYS") {
                Some(raw) => {
                    let value: i64 = raw.parse().map_err(|_| {
                        ConfigError::InvalidSearchWindow(format!(
                            "must be an integer, got '{raw}'"
                        ))
                    })?;
                    if value <= 0 {
                        return Err(ConfigError::InvalidSearchWindow(format!(
                            "must be positive, got {value}"
                        )));
                    }
                    value
                }
                None => DEFAULT_OCCURRENCE_SEARCH_WINDOW_DAYS,
            };

        let occurrence_binder_candidate_limit =
            match vars.get("MEETING_CORE_OCCURRENCE_CANDIDATE_LIMIT") {
                Some(raw) => {
                    let value: usize = raw.parse().map_err(|_| {
                        ConfigError::InvalidCandidateLimit(format!(
                            "must be a positive integer, got '{raw}'"
                        ))
                    })?;
                    if value == 0 {
                        return Err(ConfigError::InvalidCandidateLimit(
                            "must be greater than 0".to_string(),
                        ));
                    }
                    value
                }
                None => DEFAULT_OCCURRENCE_CANDIDATE_LIMIT,
            };

        let conflict_retry_limit = match vars.get("MEETING_CORE_CONFLICT_RETRY_LIMIT") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidConflictRetryLimit(format!(
                    "must be a non-negative integer, got '{raw}'"
                ))
            })?,
            None => DEFAULT_CONFLICT_RETRY_LIMIT,
        };

        let instance_id = vars.get("MEETING_CORE_INSTANCE_ID").cloned().unwrap_or_else(|| {
            let hostname = env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let suffix = Uuid::new_v4().to_string();
            let short_suffix = suffix.get(..8).unwrap_or("00000000");
            format!("core-{hostname}-{short_suffix}")
        });

        Ok(CoreConfig {
            worker_pool_size,
            external_lookup_timeout_ms,
            occurrence_binder_search_window_days,
            occurrence_binder_candidate_limit,
            conflict_retry_limit,
            instance_id,
        })
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_vars(&HashMap::new()).expect("defaults alone must always validate")
    }
}
