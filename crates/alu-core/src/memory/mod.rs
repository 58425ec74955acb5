//! Guest memory shared by every execution context.
//!
//! Storage is a flat array of atomic cells so that locked accesses can be
//! performed as native compare-and-swap loops in safe code. Plain accesses
//! use relaxed ordering; they never tear a single cell and never clobber
//! bytes outside the accessed range.

/// System-wide bus lock used for non-native locked accesses.
pub mod bus;
/// Atomic cell type and little-endian lane helpers.
pub mod cells;

use std::sync::atomic::Ordering;

use log::debug;

pub use bus::{BusGuard, BusLock, SharedBusGuard};
pub use cells::CELL_BYTES;

use crate::{AtomicPolicy, CoreConfig, FaultCode, OperandWidth};
use cells::{extract, fits_one_cell, insert, lane_shift, AtomicCell};

/// Byte-addressable guest memory backed by atomic cells.
#[derive(Debug)]
pub struct GuestMemory {
    cells: Box<[AtomicCell]>,
    len: usize,
    policy: AtomicPolicy,
    bus: BusLock,
}

impl GuestMemory {
    /// Allocates `len` zeroed bytes with the default atomic policy.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidMemorySize`] when `len` is zero or cannot
    /// be rounded up to whole cells on this host.
    pub fn new(len: usize) -> Result<Self, FaultCode> {
        Self::with_config(&CoreConfig {
            memory_bytes: len,
            ..CoreConfig::default()
        })
    }

    /// Allocates zeroed guest memory as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidMemorySize`] when the configured size is
    /// zero or cannot be rounded up to whole cells on this host.
    pub fn with_config(config: &CoreConfig) -> Result<Self, FaultCode> {
        let len = config.memory_bytes;
        if len == 0 || len.checked_add(CELL_BYTES - 1).is_none() {
            return Err(FaultCode::InvalidMemorySize);
        }
        let cell_count = len.div_ceil(CELL_BYTES);
        let cells = (0..cell_count).map(|_| AtomicCell::new(0)).collect();
        debug!(
            "guest memory: {len} bytes in {cell_count} cells of {CELL_BYTES} bytes, policy {:?}",
            config.atomic_policy
        );
        Ok(Self {
            cells,
            len,
            policy: config.atomic_policy,
            bus: BusLock::new(),
        })
    }

    /// Size in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Guest memory is never empty once constructed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Policy applied to locked accesses.
    #[must_use]
    pub const fn policy(&self) -> AtomicPolicy {
        self.policy
    }

    /// The bus lock shared by every context using this memory.
    #[must_use]
    pub const fn bus(&self) -> &BusLock {
        &self.bus
    }

    /// Returns `true` when a locked access of `width` at `addr` can use a
    /// native compare-and-swap on a single cell.
    #[must_use]
    pub const fn is_native_atomic(&self, addr: u64, width: OperandWidth) -> bool {
        matches!(self.policy, AtomicPolicy::Native)
            && width.bytes() <= CELL_BYTES
            && addr % width.bytes() as u64 == 0
    }

    /// Reads a little-endian value of `width` at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnmappedMemory`] when any byte lies outside
    /// guest memory.
    pub fn read(&self, addr: u64, width: OperandWidth) -> Result<u64, FaultCode> {
        let start = self.check_range(addr, width.bytes())?;
        Ok(self.read_checked(start, width))
    }

    /// Writes the low `width` bits of `value` little-endian at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnmappedMemory`] when any byte lies outside
    /// guest memory.
    pub fn write(&self, addr: u64, width: OperandWidth, value: u64) -> Result<(), FaultCode> {
        let start = self.check_range(addr, width.bytes())?;
        self.write_checked(start, width, value);
        Ok(())
    }

    /// Copies guest bytes starting at `addr` into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnmappedMemory`] when the range leaves guest
    /// memory; `out` is untouched in that case.
    pub fn read_bytes(&self, addr: u64, out: &mut [u8]) -> Result<(), FaultCode> {
        let start = self.check_range(addr, out.len())?;
        for (offset, byte) in out.iter_mut().enumerate() {
            *byte = self.read_byte(start + offset);
        }
        Ok(())
    }

    /// Copies `bytes` into guest memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnmappedMemory`] when the range leaves guest
    /// memory; nothing is written in that case.
    pub fn write_bytes(&self, addr: u64, bytes: &[u8]) -> Result<(), FaultCode> {
        let start = self.check_range(addr, bytes.len())?;
        for (offset, byte) in bytes.iter().enumerate() {
            self.write_checked(start + offset, OperandWidth::Byte, u64::from(*byte));
        }
        Ok(())
    }

    /// Snapshot of the whole guest image.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        (0..self.len).map(|index| self.read_byte(index)).collect()
    }

    /// Validates `[addr, addr + bytes)` and returns the start offset.
    pub(crate) fn check_range(&self, addr: u64, bytes: usize) -> Result<usize, FaultCode> {
        let start = usize::try_from(addr).map_err(|_| FaultCode::UnmappedMemory)?;
        match start.checked_add(bytes) {
            Some(end) if end <= self.len => Ok(start),
            _ => Err(FaultCode::UnmappedMemory),
        }
    }

    /// Cell holding byte `start` and the bit offset of that byte.
    pub(crate) fn cell(&self, start: usize) -> (&AtomicCell, u32) {
        (&self.cells[start / CELL_BYTES], lane_shift(start))
    }

    pub(crate) fn read_checked(&self, start: usize, width: OperandWidth) -> u64 {
        if fits_one_cell(start, width.bytes()) {
            let (cell, shift) = self.cell(start);
            return extract(cell.load(Ordering::Relaxed), shift, width);
        }
        (0..width.bytes()).fold(0, |value, offset| {
            value | (u64::from(self.read_byte(start + offset)) << (8 * offset))
        })
    }

    pub(crate) fn write_checked(&self, start: usize, width: OperandWidth, value: u64) {
        if fits_one_cell(start, width.bytes()) {
            let (cell, shift) = self.cell(start);
            if width.bytes() == CELL_BYTES {
                cell.store(insert(0, shift, width, value), Ordering::Relaxed);
            } else {
                // The closure always returns `Some`, so the update cannot fail.
                let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |word| {
                    Some(insert(word, shift, width, value))
                });
            }
            return;
        }
        for offset in 0..width.bytes() {
            self.write_checked(start + offset, OperandWidth::Byte, value >> (8 * offset));
        }
    }

    fn read_byte(&self, index: usize) -> u8 {
        let (cell, shift) = self.cell(index);
        let byte = extract(cell.load(Ordering::Relaxed), shift, OperandWidth::Byte);
        u8::try_from(byte).unwrap_or_default()
    }
}
