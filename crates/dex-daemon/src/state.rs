//! Shared runtime state for dex-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use dex_sync::{BootstrapOutcome, CatalogService};

pub const DEFAULT_BOOTSTRAP_TARGET: u64 = 300;

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub service: Arc<CatalogService>,
    /// Store backend name for health output.
    pub store_backend: &'static str,
    /// Serializes bootstrap, seed, import and local writes so a bootstrap
    /// never clears a record written during its run.
    pub sync_lock: Arc<Mutex<()>>,
    /// Default target for `POST /v1/sync/bootstrap`.
    pub bootstrap_target: u64,
}

impl AppState {
    pub fn new(service: CatalogService) -> Self {
        let store_backend = service.store_backend();
        Self {
            build: BuildInfo {
                service: "dex-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            service: Arc::new(service),
            store_backend,
            sync_lock: Arc::new(Mutex::new(())),
            bootstrap_target: DEFAULT_BOOTSTRAP_TARGET,
        }
    }

    pub fn with_bootstrap_target(mut self, target: u64) -> Self {
        self.bootstrap_target = target;
        self
    }
}

/// One-shot startup task: populate an empty store before the listener binds.
///
/// Failure is logged and the daemon keeps serving with whatever the store
/// already holds.
pub async fn run_startup_bootstrap(state: &AppState, target: u64) -> Option<BootstrapOutcome> {
    let _guard = state.sync_lock.lock().await;
    match state.service.bootstrap_if_empty(target).await {
        Ok(outcome) => {
            match &outcome {
                BootstrapOutcome::Skipped { existing } => {
                    info!(existing, "startup bootstrap: store already populated")
                }
                BootstrapOutcome::Seeded { inserted, report } => info!(
                    run_id = %report.run_id,
                    inserted,
                    skipped = report.skipped.len(),
                    "startup bootstrap: store seeded"
                ),
            }
            Some(outcome)
        }
        Err(e) => {
            error!(error = %e, "startup bootstrap failed; serving existing data");
            None
        }
    }
}
