//! Batch fetch orchestrator.
//!
//! Drives one synchronization run against a [`CatalogUpstream`]:
//!
//! ```text
//!   Idle ─► Counting ─► Paging ─► Detailing ─► Delaying ─► Paging ─► …
//!              │           │           │
//!              ▼           ▼           ▼
//!            Done       Failed       Done
//! ```
//!
//! Pages are fetched strictly in sequence. Within a page every detail lookup
//! runs concurrently and results are gathered back in listing order. A failed
//! detail lookup skips that entity; a failed listing aborts the run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use dex_catalog::{
    normalize, CatalogEntity, CatalogUpstream, EntityKey, NormalizeOptions, PageWindow,
    MAX_PAGE_LIMIT,
};

use crate::error::SyncError;

pub const DEFAULT_BATCH_SIZE: u64 = MAX_PAGE_LIMIT;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    batch_size: u64,
    pub batch_delay: Duration,
    pub normalize: NormalizeOptions,
}

impl SyncOptions {
    pub fn new(batch_size: u64, batch_delay: Duration, normalize: NormalizeOptions) -> Self {
        Self {
            batch_size: batch_size.clamp(1, MAX_PAGE_LIMIT),
            batch_delay,
            normalize,
        }
    }

    /// Page size, always in `1..=MAX_PAGE_LIMIT`.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::new(
            DEFAULT_BATCH_SIZE,
            DEFAULT_BATCH_DELAY,
            NormalizeOptions::default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Phase machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncPhase {
    Idle,
    Counting,
    Paging,
    Detailing,
    Delaying,
    /// **Terminal.**
    Done,
    /// **Terminal.**
    Failed,
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Failed)
    }

    pub fn can_transition_to(self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (self, next),
            (Idle, Counting)
                | (Counting, Paging)
                | (Counting, Done)
                | (Counting, Failed)
                | (Paging, Detailing)
                | (Paging, Failed)
                | (Detailing, Delaying)
                | (Detailing, Done)
                | (Delaying, Paging)
        )
    }
}

/// Current phase plus the full trace of phases entered, starting at `Idle`.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: SyncPhase,
    trace: Vec<SyncPhase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self {
            current: SyncPhase::Idle,
            trace: vec![SyncPhase::Idle],
        }
    }
}

impl PhaseTracker {
    pub fn current(&self) -> SyncPhase {
        self.current
    }

    pub fn trace(&self) -> &[SyncPhase] {
        &self.trace
    }

    pub fn advance(&mut self, next: SyncPhase) -> Result<(), SyncError> {
        if !self.current.can_transition_to(next) {
            return Err(SyncError::Unrecoverable(format!(
                "illegal phase transition: {:?} -> {:?}",
                self.current, next
            )));
        }
        self.current = next;
        self.trace.push(next);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub key: String,
    pub reason: String,
}

/// Outcome summary of one run. Returned and logged, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub requested: u64,
    pub upstream_total: u64,
    pub effective_target: u64,
    pub pages: u64,
    pub fetched: u64,
    pub skipped: Vec<SkippedEntity>,
    pub phases: Vec<SyncPhase>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SyncRun {
    pub entities: Vec<CatalogEntity>,
    pub report: SyncReport,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct BatchOrchestrator<'a> {
    upstream: &'a dyn CatalogUpstream,
    options: &'a SyncOptions,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(upstream: &'a dyn CatalogUpstream, options: &'a SyncOptions) -> Self {
        Self { upstream, options }
    }

    /// Fetch and normalize up to `requested` entities.
    pub async fn run(&self, requested: u64) -> Result<SyncRun, SyncError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut phases = PhaseTracker::default();

        phases.advance(SyncPhase::Counting)?;
        let upstream_total = self.upstream.fetch_total_count().await;
        let effective_target = requested.min(upstream_total);
        info!(
            %run_id,
            source = self.upstream.source_name(),
            requested,
            upstream_total,
            effective_target,
            "sync run started"
        );

        let batch_size = self.options.batch_size();
        let mut entities = Vec::new();
        let mut skipped = Vec::new();
        let mut pages = 0u64;
        let mut offset = 0u64;

        if effective_target == 0 {
            phases.advance(SyncPhase::Done)?;
        }

        while offset < effective_target {
            if offset > 0 {
                phases.advance(SyncPhase::Delaying)?;
                debug!(%run_id, delay_ms = self.options.batch_delay.as_millis() as u64, "batch delay");
                tokio::time::sleep(self.options.batch_delay).await;
            }

            phases.advance(SyncPhase::Paging)?;
            let limit = batch_size.min(effective_target - offset);
            let window = PageWindow::new(limit, offset);
            let mut keys = match self.upstream.fetch_page(window).await {
                Ok(keys) => keys,
                Err(e) => {
                    phases.advance(SyncPhase::Failed)?;
                    error!(%run_id, offset, limit, error = %e, phases = ?phases.trace(), "listing failed; run aborted");
                    return Err(SyncError::Unrecoverable(format!(
                        "listing at offset {offset} failed: {e}"
                    )));
                }
            };
            pages += 1;
            if keys.len() as u64 > window.limit() {
                warn!(%run_id, offset, limit, returned = keys.len(), "listing over-delivered; truncated");
                keys.truncate(window.limit() as usize);
            }

            phases.advance(SyncPhase::Detailing)?;
            let (batch, batch_skipped) = self.detail_batch(keys).await;
            info!(
                %run_id,
                offset,
                limit,
                fetched = batch.len(),
                skipped = batch_skipped.len(),
                "batch complete"
            );
            entities.extend(batch);
            skipped.extend(batch_skipped);

            offset = offset.saturating_add(limit);
            if offset >= effective_target {
                phases.advance(SyncPhase::Done)?;
            }
        }

        if !phases.current().is_terminal() {
            return Err(SyncError::Unrecoverable(format!(
                "run ended in non-terminal phase {:?}",
                phases.current()
            )));
        }

        let report = SyncReport {
            run_id,
            requested,
            upstream_total,
            effective_target,
            pages,
            fetched: entities.len() as u64,
            skipped,
            phases: phases.trace().to_vec(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            %run_id,
            pages = report.pages,
            fetched = report.fetched,
            skipped = report.skipped.len(),
            "sync run finished"
        );

        Ok(SyncRun { entities, report })
    }

    /// Fetch + normalize `keys`; output keeps listing order.
    ///
    /// At most `batch_size` lookups are in flight at once: chunks run
    /// concurrently inside, one after another.
    pub async fn detail_batch(
        &self,
        keys: Vec<String>,
    ) -> (Vec<CatalogEntity>, Vec<SkippedEntity>) {
        let chunk_size = usize::try_from(self.options.batch_size()).unwrap_or(usize::MAX);

        let mut entities = Vec::with_capacity(keys.len());
        let mut skipped = Vec::new();
        for chunk in keys.chunks(chunk_size) {
            let lookups = chunk.iter().cloned().map(|raw| self.detail_one(raw));
            for outcome in join_all(lookups).await {
                match outcome {
                    Ok(entity) => entities.push(entity),
                    Err(s) => {
                        warn!(key = %s.key, reason = %s.reason, "entity skipped");
                        skipped.push(s);
                    }
                }
            }
        }
        (entities, skipped)
    }

    async fn detail_one(&self, raw: String) -> Result<CatalogEntity, SkippedEntity> {
        let skip = |reason: String| SkippedEntity {
            key: raw.clone(),
            reason,
        };
        let key = EntityKey::parse(&raw).map_err(|e| skip(e.to_string()))?;
        let detail = self
            .upstream
            .fetch_detail(&key)
            .await
            .map_err(|e| skip(e.to_string()))?;
        Ok(normalize(
            &detail.primary,
            &detail.secondary,
            &self.options.normalize,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions_only() {
        use SyncPhase::*;
        assert!(Idle.can_transition_to(Counting));
        assert!(Detailing.can_transition_to(Delaying));
        assert!(Delaying.can_transition_to(Paging));
        assert!(!Idle.can_transition_to(Paging));
        assert!(!Delaying.can_transition_to(Done));
        assert!(!Done.can_transition_to(Counting));
        assert!(!Failed.can_transition_to(Idle));
        assert!(Done.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn tracker_records_trace_and_rejects_illegal_step() {
        let mut t = PhaseTracker::default();
        t.advance(SyncPhase::Counting).unwrap();
        t.advance(SyncPhase::Done).unwrap();
        assert_eq!(
            t.trace(),
            &[SyncPhase::Idle, SyncPhase::Counting, SyncPhase::Done]
        );

        let err = t.advance(SyncPhase::Paging).unwrap_err();
        assert!(matches!(err, SyncError::Unrecoverable(_)));
        assert_eq!(t.current(), SyncPhase::Done);
    }

    #[test]
    fn batch_size_is_clamped() {
        let o = SyncOptions::new(500, DEFAULT_BATCH_DELAY, NormalizeOptions::default());
        assert_eq!(o.batch_size(), MAX_PAGE_LIMIT);
        let o = SyncOptions::new(0, DEFAULT_BATCH_DELAY, NormalizeOptions::default());
        assert_eq!(o.batch_size(), 1);
        assert_eq!(SyncOptions::default().batch_delay, Duration::from_millis(500));
    }
}
