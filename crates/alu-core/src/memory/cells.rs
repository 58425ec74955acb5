//! Atomic cell storage and canonical little-endian lane mapping.
//!
//! Guest byte `n` lives in cell `n / CELL_BYTES` at bit offset
//! `8 * (n % CELL_BYTES)`. The mapping is arithmetic, so the stored
//! representation is little-endian whatever the host byte order is.

#![allow(clippy::cast_possible_truncation, clippy::unnecessary_cast)]

use crate::OperandWidth;

#[cfg(target_has_atomic = "64")]
pub(crate) type AtomicCell = std::sync::atomic::AtomicU64;
#[cfg(target_has_atomic = "64")]
pub(crate) type CellWord = u64;

#[cfg(not(target_has_atomic = "64"))]
pub(crate) type AtomicCell = std::sync::atomic::AtomicU32;
#[cfg(not(target_has_atomic = "64"))]
pub(crate) type CellWord = u32;

/// Widest access the host can perform with a single native atomic.
pub const CELL_BYTES: usize = std::mem::size_of::<CellWord>();

/// Bit offset of the lane starting at byte `start` inside its cell.
pub(crate) const fn lane_shift(start: usize) -> u32 {
    ((start % CELL_BYTES) * 8) as u32
}

/// Returns `true` when `[start, start + bytes)` stays inside one cell.
pub(crate) const fn fits_one_cell(start: usize, bytes: usize) -> bool {
    start % CELL_BYTES + bytes <= CELL_BYTES
}

/// Reads the lane of `width` at `shift` out of a cell word.
pub(crate) fn extract(word: CellWord, shift: u32, width: OperandWidth) -> u64 {
    (u64::from(word) >> shift) & width.mask()
}

/// Replaces the lane of `width` at `shift` inside a cell word.
pub(crate) fn insert(word: CellWord, shift: u32, width: OperandWidth, value: u64) -> CellWord {
    let mask = (width.mask() << shift) as CellWord;
    let lane = ((value & width.mask()) << shift) as CellWord;
    (word & !mask) | lane
}
