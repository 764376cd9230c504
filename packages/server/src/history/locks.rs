use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process serialisation of record-and-sweep per owner.
///
/// Complements the row lock taken inside the transaction: it also covers the
/// anonymous owner, which has no row to lock, and backends without
/// `SELECT ... FOR UPDATE`.
#[derive(Default)]
pub struct RetentionLocks {
    locks: DashMap<Option<i32>, Arc<Mutex<()>>>,
}

impl RetentionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `owner`'s history.
    pub async fn acquire(&self, owner: Option<i32>) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(owner).or_default().clone();
        lock.lock_owned().await
    }
}
