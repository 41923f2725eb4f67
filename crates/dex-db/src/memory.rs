//! In-memory [`CatalogStore`].
//!
//! Ids are assigned from a monotonically increasing counter that `clear`
//! resets, matching `TRUNCATE … RESTART IDENTITY` on Postgres.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use tokio::sync::RwLock;

use crate::{CatalogStore, LocalRecord, NewRecord, RecordPatch, RecordSummary};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, LocalRecord>,
}

impl Inner {
    fn insert(&mut self, rec: NewRecord) -> LocalRecord {
        self.next_id += 1;
        let row = rec.into_record(self.next_id);
        self.rows.insert(row.id, row.clone());
        row
    }
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    inner: RwLock<Inner>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryCatalogStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.read().await.rows.len() as u64)
    }

    async fn clear(&self) -> Result<()> {
        let mut g = self.inner.write().await;
        g.rows.clear();
        g.next_id = 0;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<LocalRecord>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn find_summaries(&self) -> Result<Vec<RecordSummary>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .map(|r| RecordSummary {
                id: r.id,
                name: r.name.clone(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocalRecord>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, rec: NewRecord) -> Result<LocalRecord> {
        Ok(self.inner.write().await.insert(rec))
    }

    async fn create_many(&self, recs: Vec<NewRecord>) -> Result<Vec<LocalRecord>> {
        let mut g = self.inner.write().await;
        Ok(recs.into_iter().map(|r| g.insert(r)).collect())
    }

    async fn preload(&self, id: i64, patch: &RecordPatch) -> Result<Option<LocalRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .map(|r| patch.merge_onto(r)))
    }

    async fn save(&self, rec: &LocalRecord) -> Result<LocalRecord> {
        let mut g = self.inner.write().await;
        match g.rows.get_mut(&rec.id) {
            Some(row) => {
                *row = rec.clone();
                Ok(row.clone())
            }
            None => Err(anyhow!("save failed: record #{} does not exist", rec.id)),
        }
    }

    async fn remove(&self, rec: LocalRecord) -> Result<LocalRecord> {
        self.inner
            .write()
            .await
            .rows
            .remove(&rec.id)
            .ok_or_else(|| anyhow!("remove failed: record #{} does not exist", rec.id))
    }
}
