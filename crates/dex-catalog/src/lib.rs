//! dex-catalog
//!
//! Upstream catalog access and record normalization.
//!
//! This crate owns the upstream abstraction ([`CatalogUpstream`]), the
//! PokéAPI-backed client, and the pure merge/translate step that turns two raw
//! upstream payloads into one [`CatalogEntity`].
//! It does **not** write to the store; callers (dex-sync) hand normalized
//! entities to dex-db.

pub mod normalizer;
pub mod pokeapi;
pub mod translate;
pub mod upstream;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use normalizer::{normalize, normalize_with_rng, NormalizeOptions, NormalizerError, PriceRange};
pub use pokeapi::{ClientOptions, PokeApiClient};
pub use upstream::{
    CatalogUpstream, EntityDetail, PrimaryDetail, SecondaryDetail, UpstreamError,
};

/// Upstream listing calls never ask for more than this many entries per page.
pub const MAX_PAGE_LIMIT: u64 = 50;

// ---------------------------------------------------------------------------
// EntityKey
// ---------------------------------------------------------------------------

/// Name-or-numeric key addressing one upstream entity.
///
/// Parsing trims and lowercases, so `"Pikachu"`, `" PIKACHU "` and `"pikachu"`
/// all address the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Id(u64),
    Name(String),
}

impl EntityKey {
    pub fn parse(raw: &str) -> Result<Self, InvalidKey> {
        let s = raw.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(InvalidKey(raw.to_string()));
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            return s
                .parse::<u64>()
                .map(EntityKey::Id)
                .map_err(|_| InvalidKey(raw.to_string()));
        }
        // Keys become a single URL path segment.
        let path_safe = s
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '/' | '?' | '#' | '%'));
        if !path_safe {
            return Err(InvalidKey(raw.to_string()));
        }
        Ok(EntityKey::Name(s))
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "{id}"),
            EntityKey::Name(name) => f.write_str(name),
        }
    }
}

impl FromStr for EntityKey {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKey::parse(s)
    }
}

/// A key that cannot address an upstream entity (empty or not path-safe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKey(pub String);

impl fmt::Display for InvalidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid entity key '{}'", self.0)
    }
}

impl std::error::Error for InvalidKey {}

// ---------------------------------------------------------------------------
// CategoryName
// ---------------------------------------------------------------------------

/// Upstream category (type) name: trimmed, lowercase, ASCII alphanumerics and
/// `-` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    pub fn parse(raw: &str) -> Result<Self, InvalidCategory> {
        let name = raw.trim().to_ascii_lowercase();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(InvalidCategory(raw.to_string()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CategoryName {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCategory(pub String);

impl fmt::Display for InvalidCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid category '{}'", self.0)
    }
}

impl std::error::Error for InvalidCategory {}

// ---------------------------------------------------------------------------
// PageWindow
// ---------------------------------------------------------------------------

/// One page request against the upstream listing.
///
/// `limit` is clamped to [`MAX_PAGE_LIMIT`] on construction; there is no way
/// to build a window that asks for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    limit: u64,
    offset: u64,
}

impl PageWindow {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: limit.min(MAX_PAGE_LIMIT),
            offset,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

// ---------------------------------------------------------------------------
// CatalogEntity
// ---------------------------------------------------------------------------

/// One normalized upstream entity: merged, translated and priced.
///
/// Transient: produced and consumed within a single synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntity {
    /// Upstream numeric id.
    pub upstream_id: i64,
    /// Upstream name exactly as listed (lowercase).
    pub key: String,
    /// Display name (first character capitalized).
    pub name: String,
    /// Translated category labels in upstream slot order (1 or 2 entries).
    pub categories: Vec<String>,
    pub image_url: Option<String>,
    pub price: i64,
    pub description: String,
}
