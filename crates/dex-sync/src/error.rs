use std::fmt;

use dex_catalog::UpstreamError;

/// What a `NotFound` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundTarget {
    LocalRecord(i64),
    UpstreamEntity(String),
    UpstreamCategory(String),
}

impl fmt::Display for NotFoundTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundTarget::LocalRecord(id) => write!(f, "record #{id}"),
            NotFoundTarget::UpstreamEntity(key) => write!(f, "upstream entity '{key}'"),
            NotFoundTarget::UpstreamCategory(name) => write!(f, "upstream category '{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    NotFound(NotFoundTarget),
    UpstreamUnavailable(String),
    Validation(String),
    /// Count lookup or listing failure during a run; the run is aborted.
    Unrecoverable(String),
    /// Store failure on a single-record path.
    Store(String),
}

impl SyncError {
    /// Stable machine-readable code (used in API error bodies and CLI output).
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::NotFound(_) => "NOT_FOUND",
            SyncError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            SyncError::Validation(_) => "VALIDATION",
            SyncError::Unrecoverable(_) => "SYNC_UNRECOVERABLE",
            SyncError::Store(_) => "STORE",
        }
    }

    pub(crate) fn store(e: anyhow::Error) -> Self {
        SyncError::Store(format!("{e:#}"))
    }

    /// Map an upstream failure for an entity lookup.
    pub(crate) fn from_entity_lookup(key: &str, e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotFound { .. } => {
                SyncError::NotFound(NotFoundTarget::UpstreamEntity(key.to_string()))
            }
            other => SyncError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotFound(target) => write!(f, "{target} not found"),
            SyncError::UpstreamUnavailable(msg) => write!(f, "upstream unavailable: {msg}"),
            SyncError::Validation(msg) => write!(f, "invalid input: {msg}"),
            SyncError::Unrecoverable(msg) => write!(f, "synchronization aborted: {msg}"),
            SyncError::Store(msg) => write!(f, "store failure: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}
