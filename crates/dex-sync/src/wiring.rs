//! Config → collaborators. Shared by the daemon and the CLI so both build the
//! engine the same way.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use dex_catalog::{ClientOptions, NormalizeOptions, PokeApiClient, PriceRange};
use dex_config::{AppConfig, ResolvedSecrets};
use dex_db::{CatalogStore, MemoryCatalogStore, PgCatalogStore};

use crate::controller::CatalogService;
use crate::orchestrator::SyncOptions;

pub fn sync_options(cfg: &AppConfig) -> Result<SyncOptions> {
    let price_range = PriceRange::new(cfg.catalog.price_min, cfg.catalog.price_max)
        .map_err(|e| anyhow::anyhow!("catalog price range: {e}"))?;
    Ok(SyncOptions::new(
        cfg.sync.batch_size,
        cfg.sync.batch_delay(),
        NormalizeOptions {
            language: cfg.catalog.language.clone(),
            price_range,
        },
    ))
}

pub fn client_options(cfg: &AppConfig) -> ClientOptions {
    ClientOptions {
        base_url: cfg.upstream.base_url.clone(),
        timeout: cfg.upstream.timeout(),
        user_agent: cfg.upstream.user_agent.clone(),
    }
}

/// Postgres (migrated) when a database URL resolved, in-memory otherwise.
pub async fn open_store(secrets: &ResolvedSecrets) -> Result<Arc<dyn CatalogStore>> {
    match &secrets.database_url {
        Some(url) => {
            let pool = dex_db::connect(url)
                .await
                .with_context(|| format!("connect via {}", secrets.database_url_env))?;
            dex_db::migrate(&pool).await?;
            info!(env = %secrets.database_url_env, "using postgres catalog store");
            Ok(Arc::new(PgCatalogStore::new(pool)))
        }
        None => {
            warn!(
                env = %secrets.database_url_env,
                "no database url configured; using in-memory store (data is lost on exit)"
            );
            Ok(Arc::new(MemoryCatalogStore::new()))
        }
    }
}

pub async fn build_service(cfg: &AppConfig, secrets: &ResolvedSecrets) -> Result<CatalogService> {
    let upstream = PokeApiClient::with_options(client_options(cfg))?;
    let store = open_store(secrets).await?;
    Ok(CatalogService::new(
        Arc::new(upstream),
        store,
        sync_options(cfg)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn options_follow_config() {
        let mut cfg = AppConfig::default();
        cfg.sync.batch_delay_ms = 0;
        cfg.catalog.language = "fr".to_string();
        let o = sync_options(&cfg).unwrap();
        assert_eq!(o.batch_size(), 50);
        assert_eq!(o.batch_delay, Duration::ZERO);
        assert_eq!(o.normalize.language, "fr");
        assert_eq!(o.normalize.price_range.min(), 1_000);

        let c = client_options(&cfg);
        assert_eq!(c.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_url_falls_back_to_memory() {
        let store = open_store(&ResolvedSecrets::default()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
