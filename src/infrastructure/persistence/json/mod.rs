//! JSON 快照存储

mod snapshot_store;

pub use snapshot_store::{JsonSnapshotStore, ENVELOPE_FILE, MIN_MAX_FILE};
