use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// System-wide bus lock for one guest memory.
///
/// Bus-locked accesses take the exclusive side; native compare-and-swap
/// loops take the shared side, so a bus-locked read-modify-write never
/// interleaves with a native one on overlapping bytes while native loops
/// still run concurrently with each other.
#[derive(Debug, Default)]
pub struct BusLock {
    lock: RwLock<()>,
}

/// Held while a bus-locked load/compute/store is in progress.
#[derive(Debug)]
#[must_use = "the bus is released as soon as the guard is dropped"]
pub struct BusGuard<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
}

/// Held by native atomic loops to exclude concurrent bus locks.
#[derive(Debug)]
#[must_use = "the bus is released as soon as the guard is dropped"]
pub struct SharedBusGuard<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

impl BusLock {
    /// Creates an unlocked bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asserts the bus lock, waiting for every in-flight locked access.
    pub fn exclusive(&self) -> BusGuard<'_> {
        // The lock protects no data, so a panic while it was held leaves
        // nothing inconsistent behind.
        BusGuard {
            _guard: self.lock.write().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Enters a native atomic section.
    pub fn shared(&self) -> SharedBusGuard<'_> {
        SharedBusGuard {
            _guard: self.lock.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Returns `true` when the exclusive side is free right now.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.lock.try_write().is_ok()
    }
}
