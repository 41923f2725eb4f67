//! Reconciliation controller: the operations exposed to the daemon and CLI.
//!
//! `CatalogService` owns no state of its own beyond its collaborators. Input is
//! assumed validated by the caller.

use std::sync::Arc;

use tracing::{info, warn};

use dex_catalog::{
    normalize, CatalogEntity, CatalogUpstream, CategoryName, EntityKey, PageWindow,
    UpstreamError,
};
use dex_db::{CatalogStore, LocalRecord, NewRecord, RecordPatch, RecordSummary};

use crate::error::{NotFoundTarget, SyncError};
use crate::orchestrator::{BatchOrchestrator, SyncOptions, SyncReport};

#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// Store already had records; nothing was fetched or written.
    Skipped { existing: u64 },
    Seeded { inserted: usize, report: SyncReport },
}

#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub records: Vec<LocalRecord>,
    pub report: SyncReport,
}

/// Map a normalized upstream entity to a store insert.
pub fn entity_to_new_record(e: CatalogEntity) -> NewRecord {
    NewRecord {
        name: e.name,
        categories: e.categories,
        image_url: e.image_url,
        price: Some(e.price),
        description: Some(e.description),
    }
}

pub struct CatalogService {
    upstream: Arc<dyn CatalogUpstream>,
    store: Arc<dyn CatalogStore>,
    options: SyncOptions,
}

impl CatalogService {
    pub fn new(
        upstream: Arc<dyn CatalogUpstream>,
        store: Arc<dyn CatalogStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            upstream,
            store,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    fn orchestrator(&self) -> BatchOrchestrator<'_> {
        BatchOrchestrator::new(self.upstream.as_ref(), &self.options)
    }

    // -----------------------------------------------------------------------
    // Synchronization
    // -----------------------------------------------------------------------

    /// Populate an empty store with up to `target` upstream entities.
    ///
    /// A non-empty store is left alone. The count is checked again after the
    /// run, so records written meanwhile are never cleared. On success with
    /// at least one entity the store is cleared exactly once, immediately
    /// before a single bulk write. Any failure before that point leaves the
    /// store untouched.
    pub async fn bootstrap_if_empty(&self, target: u64) -> Result<BootstrapOutcome, SyncError> {
        let existing = self.store.count().await.map_err(|e| {
            SyncError::Unrecoverable(format!("store count failed: {e:#}"))
        })?;
        if existing > 0 {
            info!(existing, "store already populated; bootstrap skipped");
            return Ok(BootstrapOutcome::Skipped { existing });
        }

        let run = self.orchestrator().run(target).await?;
        if run.entities.is_empty() {
            warn!(run_id = %run.report.run_id, "bootstrap fetched no entities; store left unchanged");
            return Ok(BootstrapOutcome::Seeded {
                inserted: 0,
                report: run.report,
            });
        }

        // The store may have been written to while the run was fetching.
        let existing = self.store.count().await.map_err(|e| {
            SyncError::Unrecoverable(format!("store count failed: {e:#}"))
        })?;
        if existing > 0 {
            warn!(
                run_id = %run.report.run_id,
                existing,
                "store populated during bootstrap; fetched entities discarded"
            );
            return Ok(BootstrapOutcome::Skipped { existing });
        }

        let records: Vec<NewRecord> = run.entities.into_iter().map(entity_to_new_record).collect();
        self.store
            .clear()
            .await
            .map_err(|e| SyncError::Unrecoverable(format!("store clear failed: {e:#}")))?;
        let inserted = self
            .store
            .create_many(records)
            .await
            .map_err(|e| SyncError::Unrecoverable(format!("bulk write failed: {e:#}")))?
            .len();

        info!(run_id = %run.report.run_id, inserted, "bootstrap complete");
        Ok(BootstrapOutcome::Seeded {
            inserted,
            report: run.report,
        })
    }

    /// Fetch up to `limit` entities and append them. Never clears; calling it
    /// twice stores duplicates.
    pub async fn seed(&self, limit: u64) -> Result<SeedOutcome, SyncError> {
        let run = self.orchestrator().run(limit).await?;
        let records = if run.entities.is_empty() {
            Vec::new()
        } else {
            self.store
                .create_many(run.entities.into_iter().map(entity_to_new_record).collect())
                .await
                .map_err(|e| SyncError::Unrecoverable(format!("bulk write failed: {e:#}")))?
        };
        info!(run_id = %run.report.run_id, inserted = records.len(), "seed complete");
        Ok(SeedOutcome {
            records,
            report: run.report,
        })
    }

    /// Fetch one entity by key and store it.
    pub async fn import_one(&self, key: &EntityKey) -> Result<LocalRecord, SyncError> {
        let entity = self.query_upstream_by_name(key).await?;
        let rec = self
            .store
            .create(entity_to_new_record(entity))
            .await
            .map_err(SyncError::store)?;
        info!(%key, id = rec.id, "entity imported");
        Ok(rec)
    }

    // -----------------------------------------------------------------------
    // Local CRUD
    // -----------------------------------------------------------------------

    pub async fn create(&self, rec: NewRecord) -> Result<LocalRecord, SyncError> {
        self.store.create(rec).await.map_err(SyncError::store)
    }

    pub async fn get_one(&self, id: i64) -> Result<LocalRecord, SyncError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(SyncError::store)?
            .ok_or(SyncError::NotFound(NotFoundTarget::LocalRecord(id)))
    }

    pub async fn get_all(&self) -> Result<Vec<LocalRecord>, SyncError> {
        self.store.find_all().await.map_err(SyncError::store)
    }

    pub async fn get_basic_list(&self) -> Result<Vec<RecordSummary>, SyncError> {
        self.store.find_summaries().await.map_err(SyncError::store)
    }

    /// Merge `patch` onto record `id` and save it. An empty patch returns the
    /// record unchanged.
    pub async fn update(&self, id: i64, patch: RecordPatch) -> Result<LocalRecord, SyncError> {
        let merged = self
            .store
            .preload(id, &patch)
            .await
            .map_err(SyncError::store)?
            .ok_or(SyncError::NotFound(NotFoundTarget::LocalRecord(id)))?;
        if patch.is_empty() {
            return Ok(merged);
        }
        self.store.save(&merged).await.map_err(SyncError::store)
    }

    pub async fn remove(&self, id: i64) -> Result<LocalRecord, SyncError> {
        let rec = self.get_one(id).await?;
        self.store.remove(rec).await.map_err(SyncError::store)
    }

    // -----------------------------------------------------------------------
    // Read-only upstream queries
    // -----------------------------------------------------------------------

    pub async fn query_upstream_by_name(
        &self,
        key: &EntityKey,
    ) -> Result<CatalogEntity, SyncError> {
        let detail = self
            .upstream
            .fetch_detail(key)
            .await
            .map_err(|e| SyncError::from_entity_lookup(&key.to_string(), e))?;
        Ok(normalize(
            &detail.primary,
            &detail.secondary,
            &self.options.normalize,
        ))
    }

    /// One listing page, detailed. Entities that fail to resolve are omitted.
    pub async fn query_upstream_list(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<CatalogEntity>, SyncError> {
        let window = PageWindow::new(limit, offset);
        let mut keys = self
            .upstream
            .fetch_page(window)
            .await
            .map_err(|e| SyncError::UpstreamUnavailable(e.to_string()))?;
        keys.truncate(window.limit() as usize);
        let (entities, _skipped) = self.orchestrator().detail_batch(keys).await;
        Ok(entities)
    }

    /// Members of `category`, truncated to `limit`, detailed in chunks of the
    /// batch size.
    pub async fn query_upstream_by_category(
        &self,
        category: &CategoryName,
        limit: u64,
    ) -> Result<Vec<CatalogEntity>, SyncError> {
        let keys = self
            .upstream
            .fetch_by_category(category.as_str(), limit)
            .await
            .map_err(|e| match e {
                UpstreamError::NotFound { .. } => {
                    SyncError::NotFound(NotFoundTarget::UpstreamCategory(category.to_string()))
                }
                other => SyncError::UpstreamUnavailable(other.to_string()),
            })?;
        let (entities, _skipped) = self.orchestrator().detail_batch(keys).await;
        Ok(entities)
    }
}
