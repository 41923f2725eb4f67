//! dex-db
//!
//! Local catalog persistence behind a narrow CRUD contract ([`CatalogStore`]).
//!
//! The sync engine only ever talks to the store through this trait. Two
//! backends ship here: Postgres (sqlx, embedded migrations) and an in-memory
//! map used when no database is configured and by tests.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use memory::MemoryCatalogStore;
pub use postgres::{connect, connect_from_env, migrate, status, DbStatus, PgCatalogStore};

pub const ENV_DB_URL: &str = "DEX_DATABASE_URL";

/// Price applied when a record is created without one.
pub const DEFAULT_PRICE: i64 = 1_000;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted catalog row. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRecord {
    pub id: i64,
    pub name: String,
    pub categories: Vec<String>,
    pub image_url: Option<String>,
    pub price: i64,
    pub description: Option<String>,
}

/// Basic projection returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: i64,
    pub name: String,
}

/// Fields for a record that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
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

impl NewRecord {
    pub fn effective_price(&self) -> i64 {
        self.price.unwrap_or(DEFAULT_PRICE)
    }

    pub fn into_record(self, id: i64) -> LocalRecord {
        let price = self.effective_price();
        LocalRecord {
            id,
            name: self.name,
            categories: self.categories,
            image_url: self.image_url,
            price,
            description: self.description,
        }
    }
}

/// Partial update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.categories.is_none()
            && self.image_url.is_none()
            && self.price.is_none()
            && self.description.is_none()
    }

    /// Merge onto an existing record; absent fields are preserved.
    pub fn merge_onto(&self, mut rec: LocalRecord) -> LocalRecord {
        if let Some(v) = &self.name {
            rec.name = v.clone();
        }
        if let Some(v) = &self.categories {
            rec.categories = v.clone();
        }
        if let Some(v) = &self.image_url {
            rec.image_url = Some(v.clone());
        }
        if let Some(v) = self.price {
            rec.price = v;
        }
        if let Some(v) = &self.description {
            rec.description = Some(v.clone());
        }
        rec
    }
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// The only verbs the sync engine uses against local persistence.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn count(&self) -> Result<u64>;

    /// Delete every record.
    async fn clear(&self) -> Result<()>;

    /// All records ordered by id.
    async fn find_all(&self) -> Result<Vec<LocalRecord>>;

    /// `find_all` restricted to `{id, name}`.
    async fn find_summaries(&self) -> Result<Vec<RecordSummary>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<LocalRecord>>;

    async fn create(&self, rec: NewRecord) -> Result<LocalRecord>;

    /// Bulk write; all-or-nothing. Returned records keep input order.
    async fn create_many(&self, recs: Vec<NewRecord>) -> Result<Vec<LocalRecord>>;

    /// Existing record with `patch` merged in, not yet saved. `None` if absent.
    async fn preload(&self, id: i64, patch: &RecordPatch) -> Result<Option<LocalRecord>>;

    /// Persist every field of an existing record.
    async fn save(&self, rec: &LocalRecord) -> Result<LocalRecord>;

    /// Delete an existing record and hand it back.
    async fn remove(&self, rec: LocalRecord) -> Result<LocalRecord>;
}
