//! Two-operand integer ALU execution core for an x86 emulator.
//!
//! Covers `add`, `or`, `adc`, `sbb`, `and`, `sub`, `xor` and `cmp` at 8, 16,
//! 32 and 64 bits, including the `LOCK`ed read-modify-write protocol and
//! the micro-op paths emitted for the hot-path translator.

/// ALU function tables, operation groups and operand widths.
pub mod alu;
pub use alu::{
    alu_fn, carry_zero_fn, plain_fn, AluFn, AluGroup, CarryZeroFn, OperandWidth, PlainFn,
    ALU_TABLE, CARRY_ZERO_TABLE, PLAIN_TABLE,
};

/// Host configuration and the interfaces the core consumes.
pub mod api;
pub use api::{
    AllFlagsLive, AtomicPolicy, CoreConfig, ExecHooks, FlagDependencies, MicroOpSink,
    PathBuilder, DEFAULT_MEMORY_BYTES,
};

/// Per-context register and flag state.
pub mod state;
pub use state::{
    ExecutionState, Flags, GeneralRegister, RegisterSlot, GENERAL_REGISTER_COUNT, RFLAGS_RESET,
};

/// Atomic guest memory and the bus lock.
pub mod memory;
pub use memory::{BusGuard, BusLock, GuestMemory, SharedBusGuard, CELL_BYTES};

/// Decoded instruction handed over by the decoder.
pub mod instruction;
pub use instruction::{DecodedInstruction, RmOperand};

/// Fault taxonomy for collaborator contract breaches.
pub mod fault;
pub use fault::{FaultClass, FaultCode};

/// Injectable execution counters.
pub mod stats;
pub use stats::{AluCounterSnapshot, AluCounters, AluEvent, AluStats};

/// Width dispatch and the instruction entry points.
pub mod execute;
pub use execute::{
    execute_alu_byte_op, execute_alu_op, execute_alu_word_op, resolve_destination,
    resolve_source, resolve_source_slot, Location,
};

/// Micro-op emission for compiled paths.
pub mod jit;
pub use jit::{
    emit_alu_path, replay, AluKernel, EmissionStrategy, KernelFn, KernelVariant, MicroOp, Slot,
    Trace,
};

#[cfg(test)]
use env_logger as _;
#[cfg(test)]
use proptest as _;
