//! dex-sync
//!
//! Batch synchronization and reconciliation between the upstream catalog and
//! the local store.
//!
//! - [`orchestrator`]: paged, throttled fetch of N entities (phase machine)
//! - [`controller`]: [`CatalogService`], the operations exposed upward
//! - [`wiring`]: build the service from configuration

pub mod controller;
pub mod error;
pub mod orchestrator;
pub mod wiring;

pub use controller::{entity_to_new_record, BootstrapOutcome, CatalogService, SeedOutcome};
pub use error::{NotFoundTarget, SyncError};
pub use orchestrator::{
    BatchOrchestrator, PhaseTracker, SkippedEntity, SyncOptions, SyncPhase, SyncReport, SyncRun,
    DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE,
};
