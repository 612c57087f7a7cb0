//! Dirty tracking and the retained-scene sync bridge

pub mod bridge;
pub mod dirty;

pub use bridge::{SyncBridge, SyncError, SyncStats};
pub use dirty::DirtySet;
