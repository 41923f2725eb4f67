//! Test doubles for the sync engine: a scripted upstream, a recording store,
//! and payload fixtures.

pub mod fixtures;
pub mod store;
pub mod upstream;

pub use store::{RecordingStore, StoreOp};
pub use upstream::{ScriptedUpstream, UpstreamCall};

use dex_db::NewRecord;

/// A plain local record insert, for pre-populating stores.
pub fn new_record(name: &str) -> NewRecord {
    NewRecord {
        name: name.to_string(),
        categories: vec!["Normal".to_string()],
        image_url: None,
        price: None,
        description: None,
    }
}
