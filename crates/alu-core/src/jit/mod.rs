//! Micro-operation paths for the hot-path translator.
//!
//! While a path is being built, each unlocked ALU instruction is also
//! described as a short micro-op sequence. Which ALU variant the sequence
//! calls depends on how many status flags are still needed downstream.

mod emit;
mod replay;
mod trace;

pub use emit::emit_alu_path;
pub use replay::replay;
pub use trace::Trace;

use crate::{
    alu_fn, carry_zero_fn, plain_fn, AluFn, AluGroup, CarryZeroFn, Flags, Location, OperandWidth,
    PlainFn, RegisterSlot,
};

/// Scratch registers of the micro-op machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Slot {
    /// Result register; every read lands here.
    Res0,
    /// Callee-saved scratch.
    Sav1,
    /// First value argument of a call.
    Arg1,
    /// Second value argument of a call.
    Arg2,
}

impl Slot {
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Which ALU table a kernel comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum KernelVariant {
    /// Result only.
    Plain,
    /// Result plus CF and ZF.
    CarryZero,
    /// Result plus all six status flags.
    Full,
}

/// A table entry named by group, width and variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AluKernel {
    /// Operation.
    pub group: AluGroup,
    /// Operand width.
    pub width: OperandWidth,
    /// Table variant.
    pub variant: KernelVariant,
}

/// A resolved kernel function pointer.
#[derive(Debug, Clone, Copy)]
pub enum KernelFn {
    /// Entry of [`crate::PLAIN_TABLE`].
    Plain(PlainFn),
    /// Entry of [`crate::CARRY_ZERO_TABLE`].
    CarryZero(CarryZeroFn),
    /// Entry of [`crate::ALU_TABLE`].
    Full(AluFn),
}

impl AluKernel {
    /// Looks the kernel up in its table.
    #[must_use]
    pub fn resolve(self) -> KernelFn {
        match self.variant {
            KernelVariant::Plain => KernelFn::Plain(plain_fn(self.group, self.width)),
            KernelVariant::CarryZero => {
                KernelFn::CarryZero(carry_zero_fn(self.group, self.width))
            }
            KernelVariant::Full => KernelFn::Full(alu_fn(self.group, self.width)),
        }
    }

    /// Returns `true` when the kernel needs the machine argument, either to
    /// write flags or to read the incoming carry.
    #[must_use]
    pub const fn needs_machine(self) -> bool {
        !matches!(self.variant, KernelVariant::Plain) || self.group.reads_carry()
    }
}

/// One micro-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MicroOp {
    /// `res0 <- r/m`.
    ReadOperand {
        /// Destination operand of the instruction.
        location: Location,
        /// Operand width.
        width: OperandWidth,
    },
    /// `res0 <- reg`.
    ReadRegister {
        /// Source register.
        slot: RegisterSlot,
        /// Operand width.
        width: OperandWidth,
    },
    /// Copies one scratch register to another.
    Move {
        /// Copied from.
        from: Slot,
        /// Copied to.
        to: Slot,
    },
    /// `arg0 <- machine`.
    LoadMachine,
    /// Inline micro-op call: `res0 <- kernel(arg0?, arg1, arg2)`.
    CallMicroOp(AluKernel),
    /// Out-of-line function call: `res0 <- kernel(arg0, arg1, arg2)`.
    CallFunction(AluKernel),
    /// `r/m <- res0`.
    WriteOperand {
        /// Destination operand of the instruction.
        location: Location,
        /// Operand width.
        width: OperandWidth,
    },
}

/// Emission tier, picked from the flags still needed after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EmissionStrategy {
    /// No status flag is needed: plain variant.
    Unflagged,
    /// Only CF and/or ZF are needed: carry/zero variant.
    CarryZero,
    /// Anything else: full function call.
    Full,
}

impl EmissionStrategy {
    /// Chooses the cheapest tier that still produces every flag in
    /// `needed`. Bits outside the status flags are ignored.
    #[must_use]
    pub const fn select(needed: Flags) -> Self {
        let needed = needed.intersection(Flags::STATUS);
        if needed.is_empty() {
            Self::Unflagged
        } else if Flags::CF.union(Flags::ZF).contains(needed) {
            Self::CarryZero
        } else {
            Self::Full
        }
    }

    /// Table variant called by this tier.
    #[must_use]
    pub const fn variant(self) -> KernelVariant {
        match self {
            Self::Unflagged => KernelVariant::Plain,
            Self::CarryZero => KernelVariant::CarryZero,
            Self::Full => KernelVariant::Full,
        }
    }
}
