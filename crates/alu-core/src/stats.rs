//! Injectable execution counters.
//!
//! The core never owns global counters. Callers that want statistics pass
//! an [`AluStats`] sink through [`crate::ExecHooks`]; [`AluCounters`] is the
//! ready-made implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::EmissionStrategy;

/// One countable occurrence on the ALU path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AluEvent {
    /// An instruction was executed, in any mode.
    Executed,
    /// A locked memory instruction completed through a native atomic loop.
    LockedNative,
    /// A locked memory instruction completed under the bus lock.
    LockedBus,
    /// Failed compare-and-swap attempts before the successful one.
    CasRetries(u32),
    /// A micro-op sequence was emitted with the given strategy.
    PathEmitted(EmissionStrategy),
}

/// Counter sink shared by every context.
pub trait AluStats: Send + Sync {
    /// Records one event.
    fn record(&self, event: AluEvent);
}

/// Point-in-time copy of [`AluCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AluCounterSnapshot {
    /// Executed instructions.
    pub executed: u64,
    /// Locked instructions completed natively.
    pub locked_native: u64,
    /// Locked instructions completed under the bus lock.
    pub locked_bus: u64,
    /// Sum of failed compare-and-swap attempts.
    pub cas_retries: u64,
    /// Paths emitted without flag bookkeeping.
    pub unflagged_paths: u64,
    /// Paths emitted with the carry/zero variant.
    pub carry_zero_paths: u64,
    /// Paths emitted with the full function call.
    pub full_paths: u64,
}

impl AluCounterSnapshot {
    /// Total number of emitted paths.
    #[must_use]
    pub const fn emitted_paths(&self) -> u64 {
        self.unflagged_paths + self.carry_zero_paths + self.full_paths
    }
}

/// Relaxed atomic counters implementing [`AluStats`].
#[derive(Debug, Default)]
pub struct AluCounters {
    executed: AtomicU64,
    locked_native: AtomicU64,
    locked_bus: AtomicU64,
    cas_retries: AtomicU64,
    unflagged_paths: AtomicU64,
    carry_zero_paths: AtomicU64,
    full_paths: AtomicU64,
}

impl AluCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every counter.
    ///
    /// Counters are read one by one, so a snapshot taken while other
    /// contexts run is not a consistent cut.
    #[must_use]
    pub fn snapshot(&self) -> AluCounterSnapshot {
        AluCounterSnapshot {
            executed: self.executed.load(Ordering::Relaxed),
            locked_native: self.locked_native.load(Ordering::Relaxed),
            locked_bus: self.locked_bus.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
            unflagged_paths: self.unflagged_paths.load(Ordering::Relaxed),
            carry_zero_paths: self.carry_zero_paths.load(Ordering::Relaxed),
            full_paths: self.full_paths.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for counter in [
            &self.executed,
            &self.locked_native,
            &self.locked_bus,
            &self.cas_retries,
            &self.unflagged_paths,
            &self.carry_zero_paths,
            &self.full_paths,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl AluStats for AluCounters {
    fn record(&self, event: AluEvent) {
        let (counter, amount) = match event {
            AluEvent::Executed => (&self.executed, 1),
            AluEvent::LockedNative => (&self.locked_native, 1),
            AluEvent::LockedBus => (&self.locked_bus, 1),
            AluEvent::CasRetries(retries) => (&self.cas_retries, u64::from(retries)),
            AluEvent::PathEmitted(EmissionStrategy::Unflagged) => (&self.unflagged_paths, 1),
            AluEvent::PathEmitted(EmissionStrategy::CarryZero) => (&self.carry_zero_paths, 1),
            AluEvent::PathEmitted(EmissionStrategy::Full) => (&self.full_paths, 1),
        };
        counter.fetch_add(amount, Ordering::Relaxed);
    }
}
