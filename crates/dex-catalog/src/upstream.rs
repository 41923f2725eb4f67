//! Upstream boundary for catalog synchronization.
//!
//! This module defines the raw payload types and the upstream trait.
//! No HTTP, no normalization and no store logic belong here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EntityKey, PageWindow};

// ---------------------------------------------------------------------------
// Raw payloads
// ---------------------------------------------------------------------------

/// Primary entity detail (`GET /pokemon/{key}`), trimmed to the fields we read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub sprites: Sprites,
    /// PokéAPI never sends this; other catalogs of the same shape may.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// Secondary enrichment detail (`GET /pokemon-species/{key}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryDetail {
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedResource,
    #[serde(default)]
    pub version: Option<NamedResource>,
}

/// Both payloads for one entity, fetched together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDetail {
    pub primary: PrimaryDetail,
    pub secondary: SecondaryDetail,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors an upstream lookup can produce.
///
/// Only two outcomes matter to callers: the resource does not exist (404) or
/// the upstream could not answer (transport, non-404 status, bad payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    NotFound { resource: String },
    Unavailable { resource: String, detail: String },
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound { .. })
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::NotFound { resource } => {
                write!(f, "upstream resource not found: {resource}")
            }
            UpstreamError::Unavailable { resource, detail } => {
                write!(f, "upstream unavailable for {resource}: {detail}")
            }
        }
    }
}

impl std::error::Error for UpstreamError {}

// ---------------------------------------------------------------------------
// Upstream trait
// ---------------------------------------------------------------------------

/// External catalog contract.
///
/// Object-safe so the engine can hold an `Arc<dyn CatalogUpstream>`;
/// `Send + Sync` so lookups can be driven concurrently from tokio tasks.
#[async_trait::async_trait]
pub trait CatalogUpstream: Send + Sync {
    /// Human-readable name identifying this upstream (e.g. `"pokeapi"`).
    fn source_name(&self) -> &'static str;

    /// Total number of entities upstream. Returns 0 on any failure; callers
    /// treat 0 as "unknown or empty".
    async fn fetch_total_count(&self) -> u64;

    /// Primary and secondary detail for one entity.
    async fn fetch_detail(&self, key: &EntityKey) -> Result<EntityDetail, UpstreamError>;

    /// Entity names for one listing page, in upstream order.
    async fn fetch_page(&self, window: PageWindow) -> Result<Vec<String>, UpstreamError>;

    /// Names of the members of `category`, in upstream order, at most `limit`.
    async fn fetch_by_category(
        &self,
        category: &str,
        limit: u64,
    ) -> Result<Vec<String>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_detail_decodes_pokeapi_shape() {
        let raw = r#"{
            "id": 6,
            "name": "charizard",
            "height": 17,
            "types": [
                {"slot": 1, "type": {"name": "fire", "url": "https://pokeapi.co/api/v2/type/10/"}},
                {"slot": 2, "type": {"name": "flying", "url": "https://pokeapi.co/api/v2/type/3/"}}
            ],
            "sprites": {
                "front_default": "https://img/6.png",
                "other": {"official-artwork": {"front_default": "https://art/6.png"}}
            }
        }"#;
        let p: PrimaryDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(p.id, 6);
        assert_eq!(p.types.len(), 2);
        assert_eq!(p.types[1].kind.name, "flying");
        assert_eq!(
            p.sprites
                .other
                .and_then(|o| o.official_artwork)
                .and_then(|a| a.front_default)
                .as_deref(),
            Some("https://art/6.png")
        );
        assert_eq!(p.price, None);
    }

    #[test]
    fn secondary_detail_tolerates_missing_entries() {
        let s: SecondaryDetail = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(s.flavor_text_entries.is_empty());
    }

    #[test]
    fn error_display() {
        let e = UpstreamError::NotFound {
            resource: "pokemon/missingmon".to_string(),
        };
        assert_eq!(e.to_string(), "upstream resource not found: pokemon/missingmon");
        assert!(e.is_not_found());

        let e = UpstreamError::Unavailable {
            resource: "pokemon".to_string(),
            detail: "http status 502".to_string(),
        };
        assert_eq!(e.to_string(), "upstream unavailable for pokemon: http status 502");
        assert!(!e.is_not_found());
    }
}
