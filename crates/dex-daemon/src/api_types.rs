//! Request and response types for dex-daemon HTTP endpoints.
//!
//! `Serialize + Deserialize` so handlers and tests share them. No business
//! logic lives here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dex_sync::SkippedEntity;

pub const DEFAULT_LIST_LIMIT: u64 = 20;
pub const DEFAULT_LIST_OFFSET: u64 = 0;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    /// Store backend, e.g. "postgres" or "memory".
    pub store: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Signed on purpose: a negative limit must reach validation, not fail
/// deserialization with a generic message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Local catalog writes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// /v1/sync/*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    pub run_id: Uuid,
    pub requested: u64,
    pub upstream_total: u64,
    pub fetched: u64,
    pub inserted: usize,
    pub skipped: Vec<SkippedEntity>,
}
