use super::ops::{carry_zero, full, plain};
use super::{AluGroup, OperandWidth};
use crate::Flags;

/// Full ALU function: returns the result and writes all six status flags.
pub type AluFn = fn(&mut Flags, u64, u64) -> u64;

/// Carry/zero ALU function: returns the result and writes only CF and ZF.
pub type CarryZeroFn = fn(&mut Flags, u64, u64) -> u64;

/// Plain ALU function: returns the result; flags are read for CF only.
pub type PlainFn = fn(Flags, u64, u64) -> u64;

macro_rules! width_row {
    ($variant:ident, $group:literal) => {
        [
            $variant::<$group, 8>,
            $variant::<$group, 16>,
            $variant::<$group, 32>,
            $variant::<$group, 64>,
        ]
    };
}

macro_rules! group_table {
    ($variant:ident) => {
        [
            width_row!($variant, 0),
            width_row!($variant, 1),
            width_row!($variant, 2),
            width_row!($variant, 3),
            width_row!($variant, 4),
            width_row!($variant, 5),
            width_row!($variant, 6),
            width_row!($variant, 7),
        ]
    };
}

/// Full functions indexed by `[group][width]`.
pub static ALU_TABLE: [[AluFn; 4]; 8] = group_table!(full);

/// Carry/zero functions indexed by `[group][width]`.
pub static CARRY_ZERO_TABLE: [[CarryZeroFn; 4]; 8] = group_table!(carry_zero);

/// Plain functions indexed by `[group][width]`.
pub static PLAIN_TABLE: [[PlainFn; 4]; 8] = group_table!(plain);

/// Looks up the full function for `group` at `width`.
#[must_use]
pub fn alu_fn(group: AluGroup, width: OperandWidth) -> AluFn {
    ALU_TABLE[group.index()][width.index()]
}

/// Looks up the carry/zero function for `group` at `width`.
#[must_use]
pub fn carry_zero_fn(group: AluGroup, width: OperandWidth) -> CarryZeroFn {
    CARRY_ZERO_TABLE[group.index()][width.index()]
}

/// Looks up the plain function for `group` at `width`.
#[must_use]
pub fn plain_fn(group: AluGroup, width: OperandWidth) -> PlainFn {
    PLAIN_TABLE[group.index()][width.index()]
}
