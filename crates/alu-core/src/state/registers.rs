use crate::{Flags, OperandWidth};

/// Number of general-purpose registers in 64-bit mode (`RAX..R15`).
pub const GENERAL_REGISTER_COUNT: usize = 16;

/// Power-on RFLAGS value: only the reserved always-one bit is set.
pub const RFLAGS_RESET: Flags = Flags::RESERVED;

/// General-purpose register identifier in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum GeneralRegister {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

impl GeneralRegister {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::Rax,
        Self::Rcx,
        Self::Rdx,
        Self::Rbx,
        Self::Rsp,
        Self::Rbp,
        Self::Rsi,
        Self::Rdi,
        Self::R8,
        Self::R9,
        Self::R10,
        Self::R11,
        Self::R12,
        Self::R13,
        Self::R14,
        Self::R15,
    ];

    /// Returns the array index for this register (`0..=15`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a REX-extended 4-bit register field.
    #[must_use]
    pub const fn from_u4(bits: u8) -> Option<Self> {
        if (bits as usize) < GENERAL_REGISTER_COUNT {
            Some(Self::ALL[bits as usize])
        } else {
            None
        }
    }
}

/// A register operand as seen at a given width.
///
/// `high_byte` selects bits 8..16 and is only meaningful for byte
/// operands named `AH`, `CH`, `DH` or `BH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterSlot {
    /// Backing 64-bit register.
    pub reg: GeneralRegister,
    /// Selects the legacy high byte of `reg`.
    pub high_byte: bool,
}

impl RegisterSlot {
    /// Full-register slot.
    #[must_use]
    pub const fn full(reg: GeneralRegister) -> Self {
        Self {
            reg,
            high_byte: false,
        }
    }

    /// Resolves a byte-register field.
    ///
    /// Without any REX prefix, encodings 4..=7 name `AH`, `CH`, `DH`, `BH`
    /// instead of `SPL`, `BPL`, `SIL`, `DIL`.
    #[must_use]
    pub const fn byte(bits: u8, rex: bool) -> Option<Self> {
        if !rex && matches!(bits, 4..=7) {
            match GeneralRegister::from_u4(bits - 4) {
                Some(reg) => Some(Self {
                    reg,
                    high_byte: true,
                }),
                None => None,
            }
        } else {
            match GeneralRegister::from_u4(bits) {
                Some(reg) => Some(Self::full(reg)),
                None => None,
            }
        }
    }
}

/// Per-context register and flag state.
///
/// Owned exclusively by one emulated execution context; never shared and
/// never subject to the locked memory protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecutionState {
    gpr: [u64; GENERAL_REGISTER_COUNT],
    flags: Flags,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            gpr: [0; GENERAL_REGISTER_COUNT],
            flags: RFLAGS_RESET,
        }
    }
}

impl ExecutionState {
    /// Reads a full 64-bit register.
    #[must_use]
    pub const fn gpr(&self, reg: GeneralRegister) -> u64 {
        self.gpr[reg.index()]
    }

    /// Writes a full 64-bit register.
    pub const fn set_gpr(&mut self, reg: GeneralRegister, value: u64) {
        self.gpr[reg.index()] = value;
    }

    /// Reads RFLAGS.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// Mutable access to RFLAGS for the ALU functions.
    pub const fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Writes RFLAGS; the reserved bit always reads back as one.
    pub const fn set_flags(&mut self, value: Flags) {
        self.flags = value.union(Flags::RESERVED);
    }

    /// Reads a register operand truncated to `width`.
    #[must_use]
    pub const fn read_slot(&self, slot: RegisterSlot, width: OperandWidth) -> u64 {
        let raw = self.gpr(slot.reg);
        if slot.high_byte {
            (raw >> 8) & 0xFF
        } else {
            raw & width.mask()
        }
    }

    /// Writes a register operand at `width`.
    ///
    /// Byte and word writes merge into the register; doubleword writes
    /// clear bits 32..64; quadword writes replace the register.
    pub const fn write_slot(&mut self, slot: RegisterSlot, width: OperandWidth, value: u64) {
        let raw = self.gpr(slot.reg);
        let merged = if slot.high_byte {
            (raw & !0xFF00) | ((value & 0xFF) << 8)
        } else {
            match width {
                OperandWidth::Byte | OperandWidth::Word => {
                    (raw & !width.mask()) | (value & width.mask())
                }
                OperandWidth::Dword => value & OperandWidth::Dword.mask(),
                OperandWidth::Qword => value,
            }
        };
        self.set_gpr(slot.reg, merged);
    }
}
