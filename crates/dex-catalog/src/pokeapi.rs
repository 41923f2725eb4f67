//! PokéAPI v2-backed [`CatalogUpstream`].
//!
//! Every call is a plain GET; failures are classified into
//! [`UpstreamError::NotFound`] (HTTP 404) and [`UpstreamError::Unavailable`]
//! (everything else).

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::upstream::{
    CatalogUpstream, EntityDetail, NamedResource, PrimaryDetail, SecondaryDetail, UpstreamError,
};
use crate::{EntityKey, PageWindow, MAX_PAGE_LIMIT};

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("dexsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PokeApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new() -> Result<Self> {
        Self::with_options(ClientOptions::default())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self> {
        Self::with_options(ClientOptions {
            base_url,
            ..ClientOptions::default()
        })
    }

    pub fn with_options(opts: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(opts.timeout)
            .user_agent(opts.user_agent)
            .build()
            .context("failed to build upstream http client")?;

        Ok(Self {
            http,
            base_url: opts.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let resource = path.trim_start_matches('/').to_string();
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "upstream request");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                resource: resource.clone(),
                detail: format!("transport: {e}"),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound { resource });
        }
        if !status.is_success() {
            return Err(UpstreamError::Unavailable {
                resource,
                detail: format!("http status {}", status.as_u16()),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                resource,
                detail: format!("decode: {e}"),
            })
    }
}

#[async_trait::async_trait]
impl CatalogUpstream for PokeApiClient {
    fn source_name(&self) -> &'static str {
        "pokeapi"
    }

    async fn fetch_total_count(&self) -> u64 {
        let query = [("limit", "1".to_string()), ("offset", "0".to_string())];
        match self.get_json::<ListResponse>("/pokemon", &query).await {
            Ok(list) => list.count,
            Err(e) => {
                warn!(error = %e, "upstream count lookup failed; reporting 0");
                0
            }
        }
    }

    async fn fetch_detail(&self, key: &EntityKey) -> Result<EntityDetail, UpstreamError> {
        let primary_path = format!("/pokemon/{key}");
        let secondary_path = format!("/pokemon-species/{key}");

        let (primary, secondary) = tokio::join!(
            self.get_json::<PrimaryDetail>(&primary_path, &[]),
            self.get_json::<SecondaryDetail>(&secondary_path, &[]),
        );

        match (primary, secondary) {
            (Ok(primary), Ok(secondary)) => Ok(EntityDetail { primary, secondary }),
            // A 404 on either side wins over a transient failure on the other.
            (Err(e @ UpstreamError::NotFound { .. }), _)
            | (_, Err(e @ UpstreamError::NotFound { .. })) => {
                warn!(%key, "entity not found upstream");
                Err(e)
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    async fn fetch_page(&self, window: PageWindow) -> Result<Vec<String>, UpstreamError> {
        let limit = window.limit().min(MAX_PAGE_LIMIT);
        let query = [
            ("limit", limit.to_string()),
            ("offset", window.offset().to_string()),
        ];
        let list = self.get_json::<ListResponse>("/pokemon", &query).await?;
        Ok(list.results.into_iter().map(|r| r.name).collect())
    }

    async fn fetch_by_category(
        &self,
        category: &str,
        limit: u64,
    ) -> Result<Vec<String>, UpstreamError> {
        let path = format!("/type/{}", category.trim().to_ascii_lowercase());
        let members = self.get_json::<TypeResponse>(&path, &[]).await?;
        Ok(members
            .pokemon
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|m| m.pokemon.name)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    count: u64,
    #[serde(default)]
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct TypeResponse {
    #[serde(default)]
    pokemon: Vec<TypeMember>,
}

#[derive(Debug, Deserialize)]
struct TypeMember {
    pokemon: NamedResource,
}
