use anyhow::{anyhow, Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::{CatalogStore, LocalRecord, NewRecord, RecordPatch, RecordSummary, ENV_DB_URL};

const RECORD_COLUMNS: &str = "id, name, categories, image_url, price, description";

/// Connect to Postgres using DEX_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_catalog_table: bool,
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='catalog_records'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_catalog_table: exists,
    })
}

fn record_from_row(row: &PgRow) -> Result<LocalRecord> {
    Ok(LocalRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        categories: row.try_get("categories")?,
        image_url: row.try_get("image_url")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
    })
}

/// Postgres-backed store over the `catalog_records` table.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn count(&self) -> Result<u64> {
        let (n,): (i64,) = sqlx::query_as("select count(*)::bigint from catalog_records")
            .fetch_one(&self.pool)
            .await
            .context("count catalog_records failed")?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("truncate table catalog_records restart identity")
            .execute(&self.pool)
            .await
            .context("clear catalog_records failed")?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<LocalRecord>> {
        let rows = sqlx::query(&format!(
            "select {RECORD_COLUMNS} from catalog_records order by id asc"
        ))
        .fetch_all(&self.pool)
        .await
        .context("find_all failed")?;
        rows.iter().map(record_from_row).collect()
    }

    async fn find_summaries(&self) -> Result<Vec<RecordSummary>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("select id, name from catalog_records order by id asc")
                .fetch_all(&self.pool)
                .await
                .context("find_summaries failed")?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| RecordSummary { id, name })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocalRecord>> {
        let row = sqlx::query(&format!(
            "select {RECORD_COLUMNS} from catalog_records where id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("find_by_id({id}) failed"))?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn create(&self, rec: NewRecord) -> Result<LocalRecord> {
        let price = rec.effective_price();
        let row = sqlx::query(&format!(
            r#"
            insert into catalog_records (name, categories, image_url, price, description)
            values ($1, $2, $3, $4, $5)
            returning {RECORD_COLUMNS}
            "#
        ))
        .bind(&rec.name)
        .bind(&rec.categories)
        .bind(&rec.image_url)
        .bind(price)
        .bind(&rec.description)
        .fetch_one(&self.pool)
        .await
        .context("insert catalog_record failed")?;
        record_from_row(&row)
    }

    async fn create_many(&self, recs: Vec<NewRecord>) -> Result<Vec<LocalRecord>> {
        let mut tx = self.pool.begin().await.context("begin create_many failed")?;
        let mut out = Vec::with_capacity(recs.len());

        for rec in &recs {
            let row = sqlx::query(&format!(
                r#"
                insert into catalog_records (name, categories, image_url, price, description)
                values ($1, $2, $3, $4, $5)
                returning {RECORD_COLUMNS}
                "#
            ))
            .bind(&rec.name)
            .bind(&rec.categories)
            .bind(&rec.image_url)
            .bind(rec.effective_price())
            .bind(&rec.description)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("bulk insert of '{}' failed", rec.name))?;
            out.push(record_from_row(&row)?);
        }

        tx.commit().await.context("commit create_many failed")?;
        debug!(rows = out.len(), "create_many committed");
        Ok(out)
    }

    async fn preload(&self, id: i64, patch: &RecordPatch) -> Result<Option<LocalRecord>> {
        Ok(self.find_by_id(id).await?.map(|r| patch.merge_onto(r)))
    }

    async fn save(&self, rec: &LocalRecord) -> Result<LocalRecord> {
        let row = sqlx::query(&format!(
            r#"
            update catalog_records
               set name = $2, categories = $3, image_url = $4, price = $5, description = $6
             where id = $1
            returning {RECORD_COLUMNS}
            "#
        ))
        .bind(rec.id)
        .bind(&rec.name)
        .bind(&rec.categories)
        .bind(&rec.image_url)
        .bind(rec.price)
        .bind(&rec.description)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("save({}) failed", rec.id))?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(anyhow!("save failed: record #{} does not exist", rec.id)),
        }
    }

    async fn remove(&self, rec: LocalRecord) -> Result<LocalRecord> {
        let res = sqlx::query("delete from catalog_records where id = $1")
            .bind(rec.id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("remove({}) failed", rec.id))?;
        if res.rows_affected() == 0 {
            return Err(anyhow!("remove failed: record #{} does not exist", rec.id));
        }
        Ok(rec)
    }
}
