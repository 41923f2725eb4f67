//! Input validation run by handlers before the engine is called.
//!
//! The engine assumes validated input: non-empty keys, positive counts, sane
//! record fields.

use dex_catalog::{CategoryName, EntityKey};
use dex_db::{NewRecord, RecordPatch};
use dex_sync::SyncError;

use crate::api_types::CreateRecordRequest;

pub const MIN_NAME_LEN: usize = 3;

fn invalid(msg: impl Into<String>) -> SyncError {
    SyncError::Validation(msg.into())
}

pub fn entity_key(raw: &str) -> Result<EntityKey, SyncError> {
    EntityKey::parse(raw).map_err(|e| invalid(e.to_string()))
}

pub fn category_name(raw: &str) -> Result<CategoryName, SyncError> {
    CategoryName::parse(raw).map_err(|e| invalid(e.to_string()))
}

/// `None` → `default`; otherwise must be > 0.
pub fn positive_limit(value: Option<i64>, default: u64) -> Result<u64, SyncError> {
    match value {
        None => Ok(default),
        Some(v) => u64::try_from(v)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| invalid(format!("limit must be a positive integer, got {v}"))),
    }
}

/// `None` → `default`; otherwise must be >= 0.
pub fn non_negative_offset(value: Option<i64>, default: u64) -> Result<u64, SyncError> {
    match value {
        None => Ok(default),
        Some(v) => u64::try_from(v).map_err(|_| invalid(format!("offset must be >= 0, got {v}"))),
    }
}

pub fn record_name(name: &str) -> Result<String, SyncError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(invalid(format!(
            "name must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn price(value: i64) -> Result<i64, SyncError> {
    if value <= 0 {
        return Err(invalid(format!("price must be positive, got {value}")));
    }
    Ok(value)
}

pub fn image_url(raw: &str) -> Result<String, SyncError> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|e| invalid(format!("image_url is not a valid url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(invalid(format!("image_url scheme must be http(s), got {other}"))),
    }
}

fn categories(values: &[String]) -> Result<Vec<String>, SyncError> {
    values
        .iter()
        .map(|c| {
            let t = c.trim();
            if t.is_empty() {
                Err(invalid("categories must not contain empty labels"))
            } else {
                Ok(t.to_string())
            }
        })
        .collect()
}

pub fn new_record(req: CreateRecordRequest) -> Result<NewRecord, SyncError> {
    Ok(NewRecord {
        name: record_name(&req.name)?,
        categories: categories(&req.categories)?,
        image_url: req.image_url.as_deref().map(image_url).transpose()?,
        price: req.price.map(price).transpose()?,
        description: req.description,
    })
}

pub fn patch(p: RecordPatch) -> Result<RecordPatch, SyncError> {
    Ok(RecordPatch {
        name: p.name.as_deref().map(record_name).transpose()?,
        categories: p.categories.as_deref().map(categories).transpose()?,
        image_url: p.image_url.as_deref().map(image_url).transpose()?,
        price: p.price.map(price).transpose()?,
        description: p.description,
    })
}
