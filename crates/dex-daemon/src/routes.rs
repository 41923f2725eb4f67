//! Axum router and all HTTP handlers for dex-daemon.
//!
//! `build_router` is the single entry point. Middleware layers (CORS,
//! tracing) are attached in `main.rs` so tests can drive the bare router.
//!
//! v1 serves the basic list and upstream queries; v2 serves full records and
//! per-record CRUD.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use dex_db::RecordPatch;
use dex_sync::BootstrapOutcome;

use crate::api_types::{
    CreateRecordRequest, HealthResponse, LimitQuery, PageQuery, SeedResponse,
    DEFAULT_LIST_LIMIT, DEFAULT_LIST_OFFSET,
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validate;

type ApiResult<T> = Result<T, ApiError>;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/catalog", get(list_basic).post(create_record))
        .route("/v2/catalog", get(list_full))
        .route(
            "/v2/catalog/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .route("/v1/upstream/entities", get(upstream_list))
        .route("/v1/upstream/entities/:key", get(upstream_by_name))
        .route("/v1/upstream/categories/:name", get(upstream_by_category))
        .route("/v1/sync/seed", post(sync_seed))
        .route("/v1/sync/import/:key", post(sync_import))
        .route("/v1/sync/bootstrap", post(sync_bootstrap))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            store: st.store_backend.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Local catalog
// ---------------------------------------------------------------------------

pub(crate) async fn list_basic(State(st): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(st.service.get_basic_list().await?))
}

pub(crate) async fn list_full(State(st): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(st.service.get_all().await?))
}

pub(crate) async fn create_record(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateRecordRequest>,
) -> ApiResult<impl IntoResponse> {
    let rec = validate::new_record(req)?;
    let _guard = st.sync_lock.lock().await;
    let created = st.service.create(rec).await?;
    info!(id = created.id, "record created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn get_record(
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(st.service.get_one(id).await?))
}

pub(crate) async fn update_record(
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<RecordPatch>,
) -> ApiResult<impl IntoResponse> {
    let patch = validate::patch(patch)?;
    let _guard = st.sync_lock.lock().await;
    Ok(Json(st.service.update(id, patch).await?))
}

pub(crate) async fn delete_record(
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let _guard = st.sync_lock.lock().await;
    let removed = st.service.remove(id).await?;
    info!(id, "record removed");
    Ok(Json(removed))
}

// ---------------------------------------------------------------------------
// Upstream queries (read-only)
// ---------------------------------------------------------------------------

pub(crate) async fn upstream_by_name(
    State(st): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let key = validate::entity_key(&key)?;
    Ok(Json(st.service.query_upstream_by_name(&key).await?))
}

pub(crate) async fn upstream_list(
    State(st): State<Arc<AppState>>,
    Query(q): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = validate::positive_limit(q.limit, DEFAULT_LIST_LIMIT)?;
    let offset = validate::non_negative_offset(q.offset, DEFAULT_LIST_OFFSET)?;
    Ok(Json(st.service.query_upstream_list(limit, offset).await?))
}

pub(crate) async fn upstream_by_category(
    State(st): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let name = validate::category_name(&name)?;
    let limit = validate::positive_limit(q.limit, DEFAULT_LIST_LIMIT)?;
    Ok(Json(
        st.service.query_upstream_by_category(&name, limit).await?,
    ))
}

// ---------------------------------------------------------------------------
// Synchronization (serialized on sync_lock with the local writes above)
// ---------------------------------------------------------------------------

pub(crate) async fn sync_seed(
    State(st): State<Arc<AppState>>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = validate::positive_limit(q.limit, DEFAULT_LIST_LIMIT)?;
    let _guard = st.sync_lock.lock().await;
    let out = st.service.seed(limit).await?;
    Ok((
        StatusCode::CREATED,
        Json(SeedResponse {
            run_id: out.report.run_id,
            requested: out.report.requested,
            upstream_total: out.report.upstream_total,
            fetched: out.report.fetched,
            inserted: out.records.len(),
            skipped: out.report.skipped,
        }),
    ))
}

pub(crate) async fn sync_import(
    State(st): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let key = validate::entity_key(&key)?;
    let _guard = st.sync_lock.lock().await;
    let rec = st.service.import_one(&key).await?;
    Ok((StatusCode::CREATED, Json(rec)))
}

/// Manual trigger of the empty-store bootstrap (same path as startup).
pub(crate) async fn sync_bootstrap(
    State(st): State<Arc<AppState>>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let target = validate::positive_limit(q.limit, st.bootstrap_target)?;
    let _guard = st.sync_lock.lock().await;
    let body = match st.service.bootstrap_if_empty(target).await? {
        BootstrapOutcome::Skipped { existing } => serde_json::json!({
            "outcome": "skipped",
            "existing": existing,
        }),
        BootstrapOutcome::Seeded { inserted, report } => serde_json::json!({
            "outcome": "seeded",
            "inserted": inserted,
            "run_id": report.run_id,
            "skipped": report.skipped,
        }),
    };
    Ok(Json(body))
}
