//! [`CatalogStore`] wrapper that logs every verb and can be told to fail.

use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Result};

use dex_db::{
    CatalogStore, LocalRecord, MemoryCatalogStore, NewRecord, RecordPatch, RecordSummary,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Count,
    Clear,
    FindAll,
    FindSummaries,
    FindById(i64),
    Create,
    CreateMany(usize),
    Preload(i64),
    Save(i64),
    Remove(i64),
}

impl StoreOp {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            StoreOp::Clear
                | StoreOp::Create
                | StoreOp::CreateMany(_)
                | StoreOp::Save(_)
                | StoreOp::Remove(_)
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryCatalogStore,
    ops: Mutex<Vec<StoreOp>>,
    fail_count: bool,
    fail_bulk_write: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` returns an error.
    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    /// `create_many` returns an error without writing.
    pub fn failing_bulk_write(mut self) -> Self {
        self.fail_bulk_write = true;
        self
    }

    /// Pre-populate without recording ops.
    pub async fn seeded(self, recs: Vec<NewRecord>) -> Result<Self> {
        self.inner.create_many(recs).await?;
        Ok(self)
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn mutations(&self) -> Vec<StoreOp> {
        self.ops().into_iter().filter(StoreOp::is_mutation).collect()
    }

    pub fn reset_ops(&self) {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, op: StoreOp) {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }
}

#[async_trait::async_trait]
impl CatalogStore for RecordingStore {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn count(&self) -> Result<u64> {
        self.record(StoreOp::Count);
        if self.fail_count {
            bail!("count unavailable (scripted failure)");
        }
        self.inner.count().await
    }

    async fn clear(&self) -> Result<()> {
        self.record(StoreOp::Clear);
        self.inner.clear().await
    }

    async fn find_all(&self) -> Result<Vec<LocalRecord>> {
        self.record(StoreOp::FindAll);
        self.inner.find_all().await
    }

    async fn find_summaries(&self) -> Result<Vec<RecordSummary>> {
        self.record(StoreOp::FindSummaries);
        self.inner.find_summaries().await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocalRecord>> {
        self.record(StoreOp::FindById(id));
        self.inner.find_by_id(id).await
    }

    async fn create(&self, rec: NewRecord) -> Result<LocalRecord> {
        self.record(StoreOp::Create);
        self.inner.create(rec).await
    }

    async fn create_many(&self, recs: Vec<NewRecord>) -> Result<Vec<LocalRecord>> {
        self.record(StoreOp::CreateMany(recs.len()));
        if self.fail_bulk_write {
            bail!("bulk write rejected (scripted failure)");
        }
        self.inner.create_many(recs).await
    }

    async fn preload(&self, id: i64, patch: &RecordPatch) -> Result<Option<LocalRecord>> {
        self.record(StoreOp::Preload(id));
        self.inner.preload(id, patch).await
    }

    async fn save(&self, rec: &LocalRecord) -> Result<LocalRecord> {
        self.record(StoreOp::Save(rec.id));
        self.inner.save(rec).await
    }

    async fn remove(&self, rec: LocalRecord) -> Result<LocalRecord> {
        self.record(StoreOp::Remove(rec.id));
        self.inner.remove(rec).await
    }
}
