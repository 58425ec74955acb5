//! Per-context execution state owned by the surrounding emulator.

/// RFLAGS value and flag-set helpers.
pub mod flags;
/// General register file and register operand slots.
pub mod registers;

pub use flags::Flags;
pub use registers::{
    ExecutionState, GeneralRegister, RegisterSlot, GENERAL_REGISTER_COUNT, RFLAGS_RESET,
};
