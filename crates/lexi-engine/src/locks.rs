//! Per-unit generation locking and the global concurrency limit.
//!
//! Two concurrent generations for the same unit would race on the guard
//! check and the final write, so each unit gets an exclusive slot: a
//! second caller gets [`EngineError::Busy`] immediately instead of
//! queueing. Across units, a semaphore bounds how many generator calls
//! run at once.

use std::sync::Arc;

use dashmap::DashMap;
use lexi_core::ids::UnitId;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};

use crate::errors::{EngineError, Result};

/// Lock registry shared by all orchestrator entry points.
pub struct UnitLocks {
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
    permits: Arc<Semaphore>,
}

/// Held for the duration of one generation. Dropping it releases both
/// the unit slot and the global permit, and retires the slot entry once
/// no other caller still references it.
#[derive(Debug)]
pub struct GenerationGuard {
    slot: Option<OwnedMutexGuard<()>>,
    key: String,
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        drop(self.slot.take());
        // strong_count == 1 means the map holds the only reference: no
        // waiter cloned the slot between our release and this check. The
        // count is read under the shard lock, which also serializes
        // `entry` in `acquire`.
        self.slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl UnitLocks {
    /// Create a registry allowing `max_concurrent` generations in flight.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Acquire the exclusive slot for `unit_id`, then wait for a global
    /// permit.
    ///
    /// Returns [`EngineError::Busy`] without waiting when the unit
    /// already has a generation in flight. Waiting for the global permit
    /// happens while holding the slot, so a queued unit keeps its place.
    pub async fn acquire(&self, unit_id: &UnitId) -> Result<GenerationGuard> {
        let slot = self
            .slots
            .entry(unit_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let slot = slot
            .try_lock_owned()
            .map_err(|_| EngineError::Busy(unit_id.as_str().to_string()))?;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Cancelled)?;

        Ok(GenerationGuard {
            slot: Some(slot),
            key: unit_id.as_str().to_string(),
            slots: Arc::clone(&self.slots),
            _permit: permit,
        })
    }

    /// Number of global permits currently available.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
