//! Per-owner upload history: persistence, the retention window and replay.

mod locks;
mod replay;
mod service;

pub use locks::RetentionLocks;
pub use replay::replay;
pub use service::{HistoryStore, enforce_retention};

/// Most records kept per owner. Older records are evicted on every upload.
pub const RETENTION_WINDOW: u64 = 5;
