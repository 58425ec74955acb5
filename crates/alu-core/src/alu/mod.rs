//! ALU function table: `(group, width)` to plain function pointers.
//!
//! Three variants exist per entry. The full variant is what the
//! interpreter always runs; the carry/zero and plain variants are only
//! called from emitted paths whose flag-dependency answer proves the
//! omitted flags dead.

mod ops;
mod table;
mod width;

pub use table::{
    alu_fn, carry_zero_fn, plain_fn, AluFn, CarryZeroFn, PlainFn, ALU_TABLE, CARRY_ZERO_TABLE,
    PLAIN_TABLE,
};
pub use width::OperandWidth;

/// The eight two-operand integer operations, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AluGroup {
    /// `add`
    Add,
    /// `or`
    Or,
    /// `adc`, add with carry.
    Adc,
    /// `sbb`, subtract with borrow.
    Sbb,
    /// `and`
    And,
    /// `sub`
    Sub,
    /// `xor`
    Xor,
    /// `cmp`, flags of `sub` without the write-back.
    Cmp,
}

impl AluGroup {
    /// All groups in table-row order.
    pub const ALL: [Self; 8] = [
        Self::Add,
        Self::Or,
        Self::Adc,
        Self::Sbb,
        Self::And,
        Self::Sub,
        Self::Xor,
        Self::Cmp,
    ];

    /// Extracts the group from bits 3..6 of an opcode byte.
    #[must_use]
    pub const fn from_opcode(opcode: u8) -> Self {
        Self::from_index((opcode & 0o70) >> 3)
    }

    /// Group for a 3-bit table row; higher bits are ignored.
    #[must_use]
    pub const fn from_index(row: u8) -> Self {
        match row & 7 {
            0 => Self::Add,
            1 => Self::Or,
            2 => Self::Adc,
            3 => Self::Sbb,
            4 => Self::And,
            5 => Self::Sub,
            6 => Self::Xor,
            _ => Self::Cmp,
        }
    }

    /// Table row for this group.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// `adc` and `sbb` consume the incoming carry flag.
    #[must_use]
    pub const fn reads_carry(self) -> bool {
        matches!(self, Self::Adc | Self::Sbb)
    }

    /// Every group except `cmp` writes its destination.
    #[must_use]
    pub const fn writes_destination(self) -> bool {
        !matches!(self, Self::Cmp)
    }
}
