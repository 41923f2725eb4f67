//! Scripted, in-process [`CatalogUpstream`].
//!
//! Serves a fixed listing, records every call, and fails on demand. No
//! network I/O.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use dex_catalog::{CatalogUpstream, EntityDetail, EntityKey, PageWindow, UpstreamError};

use crate::fixtures;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCall {
    TotalCount,
    Page(PageWindow),
    Detail(String),
    Category(String, u64),
}

#[derive(Debug, Default)]
pub struct ScriptedUpstream {
    names: Vec<String>,
    total_override: Option<u64>,
    missing: HashSet<String>,
    unavailable: HashSet<String>,
    fail_listing_at: Option<u64>,
    details: HashMap<String, EntityDetail>,
    categories: HashMap<String, Vec<String>>,
    over_delivery: usize,
    detail_delay: Duration,
    details_in_flight: AtomicUsize,
    peak_details_in_flight: AtomicUsize,
    calls: Mutex<Vec<UpstreamCall>>,
}

impl ScriptedUpstream {
    /// Listing of `names`; every name resolves to a generated detail.
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    /// Listing of `count` generated names (`mon-001` …).
    pub fn with_catalog(count: usize) -> Self {
        Self::new(fixtures::generated_names(count))
    }

    /// Report `total` from the count lookup regardless of the listing length.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total_override = Some(total);
        self
    }

    /// Detail lookups for `key` answer 404.
    pub fn missing(mut self, key: &str) -> Self {
        self.missing.insert(key.to_ascii_lowercase());
        self
    }

    /// Detail lookups for `key` fail as unavailable.
    pub fn unavailable(mut self, key: &str) -> Self {
        self.unavailable.insert(key.to_ascii_lowercase());
        self
    }

    /// Listing requests at `offset` fail as unavailable.
    pub fn failing_listing_at(mut self, offset: u64) -> Self {
        self.fail_listing_at = Some(offset);
        self
    }

    /// Serve a specific detail for `key` instead of a generated one.
    pub fn with_detail(mut self, key: &str, detail: EntityDetail) -> Self {
        self.details.insert(key.to_ascii_lowercase(), detail);
        self
    }

    pub fn with_category(mut self, name: &str, members: &[&str]) -> Self {
        self.categories.insert(
            name.to_ascii_lowercase(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    /// Listing pages return `extra` more names than the window asked for.
    pub fn over_delivering(mut self, extra: usize) -> Self {
        self.over_delivery = extra;
        self
    }

    /// Every detail lookup sleeps for `delay` (tokio time) before answering.
    pub fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }

    /// Highest number of detail lookups observed in flight at once.
    pub fn peak_concurrent_details(&self) -> usize {
        self.peak_details_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: UpstreamCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Page windows requested, in order.
    pub fn page_windows(&self) -> Vec<PageWindow> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UpstreamCall::Page(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn detail_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, UpstreamCall::Detail(_)))
            .count()
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        self.names.iter().position(|n| n == key)
    }
}

#[async_trait::async_trait]
impl CatalogUpstream for ScriptedUpstream {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_total_count(&self) -> u64 {
        self.record(UpstreamCall::TotalCount);
        self.total_override.unwrap_or(self.names.len() as u64)
    }

    async fn fetch_detail(&self, key: &EntityKey) -> Result<EntityDetail, UpstreamError> {
        let k = key.to_string();
        self.record(UpstreamCall::Detail(k.clone()));

        let now = self.details_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_details_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.detail_delay.is_zero() {
            tokio::time::sleep(self.detail_delay).await;
        }
        self.details_in_flight.fetch_sub(1, Ordering::SeqCst);
        let resource = format!("pokemon/{k}");

        if self.missing.contains(&k) {
            return Err(UpstreamError::NotFound { resource });
        }
        if self.unavailable.contains(&k) {
            return Err(UpstreamError::Unavailable {
                resource,
                detail: "http status 503".to_string(),
            });
        }
        if let Some(d) = self.details.get(&k) {
            return Ok(d.clone());
        }

        let id = match key {
            EntityKey::Id(id) => i64::try_from(*id).unwrap_or(i64::MAX),
            EntityKey::Name(_) => match self.position_of(&k) {
                Some(i) => i as i64 + 1,
                None => return Err(UpstreamError::NotFound { resource }),
            },
        };
        Ok(fixtures::generated_detail(id, &k))
    }

    async fn fetch_page(&self, window: PageWindow) -> Result<Vec<String>, UpstreamError> {
        self.record(UpstreamCall::Page(window));
        if self.fail_listing_at == Some(window.offset()) {
            return Err(UpstreamError::Unavailable {
                resource: "pokemon".to_string(),
                detail: "http status 502".to_string(),
            });
        }
        Ok(self
            .names
            .iter()
            .skip(window.offset() as usize)
            .take(window.limit() as usize + self.over_delivery)
            .cloned()
            .collect())
    }

    async fn fetch_by_category(
        &self,
        category: &str,
        limit: u64,
    ) -> Result<Vec<String>, UpstreamError> {
        let name = category.trim().to_ascii_lowercase();
        self.record(UpstreamCall::Category(name.clone(), limit));
        match self.categories.get(&name) {
            Some(members) => Ok(members.iter().take(limit as usize).cloned().collect()),
            None => Err(UpstreamError::NotFound {
                resource: format!("type/{name}"),
            }),
        }
    }
}
