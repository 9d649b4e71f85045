//! Error taxonomy for the ingestion pipeline.
//!
//! These are the error *kinds* the coordinator (C6) matches on to decide
//! retry/skip/abort behavior. Individual components raise `anyhow::Error`
//! internally (for context chains) and wrap the terminal cause in one of
//! these variants at the boundary the coordinator observes.

use std::fmt;

/// Error kinds surfaced to the Ingestion Coordinator.
#[derive(Debug)]
pub enum CoreError {
    /// Network/timeout fetching from the upstream feed. Retried with
    /// exponential backoff; the cycle is skipped.
    FeedUnavailable(anyhow::Error),
    /// The feed returned a structurally invalid top-level document.
    /// Non-retryable; the cycle is skipped.
    FeedCorrupt(anyhow::Error),
    /// A single record failed type/range coercion. The record is dropped;
    /// the batch continues.
    RecordInvalid { reason: String },
    /// Transient database error (lock, timeout, pool exhaustion). The
    /// transaction is rolled back and retried next cycle.
    PersistenceTransient(anyhow::Error),
    /// Schema mismatch, constraint drift, or auth failure. Unrecoverable;
    /// the process aborts with exit code 2.
    PersistenceFatal(anyhow::Error),
    /// Missing required option, malformed polygon, or unreadable reference
    /// file. Unrecoverable at startup; exit code 1.
    Configuration(anyhow::Error),
    /// An exception inside a detector (C7-C10). Logged with context; the
    /// cycle continues and the affected detection is skipped this round.
    Detector(anyhow::Error),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::FeedUnavailable(e) => write!(f, "feed unavailable: {e}"),
            CoreError::FeedCorrupt(e) => write!(f, "feed corrupt: {e}"),
            CoreError::RecordInvalid { reason } => write!(f, "record invalid: {reason}"),
            CoreError::PersistenceTransient(e) => write!(f, "persistence transient: {e}"),
            CoreError::PersistenceFatal(e) => write!(f, "persistence fatal: {e}"),
            CoreError::Configuration(e) => write!(f, "configuration error: {e}"),
            CoreError::Detector(e) => write!(f, "detector error: {e}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::FeedUnavailable(e)
            | CoreError::FeedCorrupt(e)
            | CoreError::PersistenceTransient(e)
            | CoreError::PersistenceFatal(e)
            | CoreError::Configuration(e)
            | CoreError::Detector(e) => Some(e.as_ref()),
            CoreError::RecordInvalid { .. } => None,
        }
    }
}

impl CoreError {
    /// Whether the coordinator should retry the operation that produced
    /// this error (on its own backoff schedule) rather than aborting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::FeedUnavailable(_) | CoreError::PersistenceTransient(_)
        )
    }

    /// Process exit code mandated by §6 when this error terminates `run`.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Configuration(_) => 1,
            CoreError::PersistenceFatal(_) => 2,
            _ => 0,
        }
    }
}
