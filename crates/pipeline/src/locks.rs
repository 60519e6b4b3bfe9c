//! Per-video mutual exclusion.
//!
//! Two saves for the same video would otherwise interleave their summary
//! update and log insert. Saves for different videos never wait on each
//! other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use smartway_core::types::DbId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct VideoLocks {
    locks: Mutex<HashMap<DbId, Arc<AsyncMutex<()>>>>,
}

impl VideoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `video_id`. Released when the guard drops.
    pub async fn lock(&self, video_id: DbId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(video_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of videos with a held or awaited lock.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
