//! Decoded instruction handed over by the decoder.
//!
//! Only the fields the ALU group needs are carried. Prefix parsing and
//! effective-address computation have already happened.

use crate::{AluGroup, OperandWidth};

/// The `r/m` operand after addressing-mode resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RmOperand {
    /// Register form; the field is already REX.B-extended.
    Register(u8),
    /// Memory form with the resolved guest address.
    Memory(u64),
}

/// One decoded `op r/m, reg` instruction of the ALU group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Address of the instruction.
    pub ip: u64,
    /// Primary opcode byte (`0x00..=0x3D`).
    pub opcode: u8,
    /// `LOCK` prefix present.
    pub lock: bool,
    /// Operand-size override (`0x66`) present.
    pub osz: bool,
    /// `REX.W` set.
    pub rex_w: bool,
    /// Any REX prefix present.
    pub rex: bool,
    /// REX.R-extended `reg` field naming the source register.
    pub reg: u8,
    /// Destination operand.
    pub rm: RmOperand,
}

impl DecodedInstruction {
    /// Unprefixed instruction at address zero.
    #[must_use]
    pub const fn new(opcode: u8, reg: u8, rm: RmOperand) -> Self {
        Self {
            ip: 0,
            opcode,
            lock: false,
            osz: false,
            rex_w: false,
            rex: false,
            reg,
            rm,
        }
    }

    /// Builds the `op r/m, reg` encoding of `group`.
    #[must_use]
    pub const fn alu(group: AluGroup, byte: bool, reg: u8, rm: RmOperand) -> Self {
        let opcode = ((group as u8) << 3) | if byte { 0 } else { 1 };
        Self::new(opcode, reg, rm)
    }

    /// Places the instruction at `ip`.
    #[must_use]
    pub const fn at(mut self, ip: u64) -> Self {
        self.ip = ip;
        self
    }

    /// Adds a `LOCK` prefix.
    #[must_use]
    pub const fn locked(mut self) -> Self {
        self.lock = true;
        self
    }

    /// Adds the operand-size override prefix.
    #[must_use]
    pub const fn with_osz(mut self) -> Self {
        self.osz = true;
        self
    }

    /// Adds a REX prefix without `W`.
    #[must_use]
    pub const fn with_rex(mut self) -> Self {
        self.rex = true;
        self
    }

    /// Adds a REX prefix with `W` set.
    #[must_use]
    pub const fn with_rex_w(mut self) -> Self {
        self.rex = true;
        self.rex_w = true;
        self
    }

    /// Operation group encoded in opcode bits 3..6.
    #[must_use]
    pub const fn group(&self) -> AluGroup {
        AluGroup::from_opcode(self.opcode)
    }

    /// Opcode bit 0 clear selects the byte form.
    #[must_use]
    pub const fn is_byte_op(&self) -> bool {
        self.opcode & 1 == 0
    }

    /// Width of the word form: `REX.W` wins over the operand-size override.
    #[must_use]
    pub const fn word_width(&self) -> OperandWidth {
        if self.rex_w {
            OperandWidth::Qword
        } else if self.osz {
            OperandWidth::Word
        } else {
            OperandWidth::Dword
        }
    }

    /// Effective operand width.
    #[must_use]
    pub const fn width(&self) -> OperandWidth {
        if self.is_byte_op() {
            OperandWidth::Byte
        } else {
            self.word_width()
        }
    }
}
