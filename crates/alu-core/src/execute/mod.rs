//! Width dispatch and entry points for the two-operand ALU group.
//!
//! Every entry point follows the same sequence:
//! 1. Resolve the destination (write access) and source (read access)
//! 2. Run the read-modify-write protocol for the prefix and destination
//! 3. Record statistics
//! 4. Emit an equivalent micro-op path when one is being built and the
//!    instruction is not locked
//!
//! Faults are only raised in step 1, so a faulting instruction has no side
//! effects.

/// Operand locations and their plain load/store helpers.
pub mod operands;
mod rmw;

pub use operands::{resolve_destination, resolve_source, resolve_source_slot, Location};

use crate::jit::emit_alu_path;
use crate::{
    AluEvent, DecodedInstruction, ExecHooks, ExecutionState, FaultCode, GuestMemory, OperandWidth,
};
use rmw::RmwRequest;

/// Executes the 8-bit form (`opcode` bit 0 clear).
///
/// # Errors
///
/// Returns the collaborator contract breach found while resolving operands;
/// no state has been modified in that case.
pub fn execute_alu_byte_op(
    instr: &DecodedInstruction,
    state: &mut ExecutionState,
    memory: &GuestMemory,
    hooks: &mut ExecHooks<'_>,
) -> Result<(), FaultCode> {
    execute_at_width(instr, OperandWidth::Byte, state, memory, hooks)
}

/// Executes the 16/32/64-bit form, choosing the width from the size
/// prefixes.
///
/// # Errors
///
/// Returns the collaborator contract breach found while resolving operands;
/// no state has been modified in that case.
pub fn execute_alu_word_op(
    instr: &DecodedInstruction,
    state: &mut ExecutionState,
    memory: &GuestMemory,
    hooks: &mut ExecHooks<'_>,
) -> Result<(), FaultCode> {
    execute_at_width(instr, instr.word_width(), state, memory, hooks)
}

/// Executes either form, selected by opcode bit 0.
///
/// # Errors
///
/// Returns the collaborator contract breach found while resolving operands;
/// no state has been modified in that case.
pub fn execute_alu_op(
    instr: &DecodedInstruction,
    state: &mut ExecutionState,
    memory: &GuestMemory,
    hooks: &mut ExecHooks<'_>,
) -> Result<(), FaultCode> {
    if instr.is_byte_op() {
        execute_alu_byte_op(instr, state, memory, hooks)
    } else {
        execute_alu_word_op(instr, state, memory, hooks)
    }
}

fn execute_at_width(
    instr: &DecodedInstruction,
    width: OperandWidth,
    state: &mut ExecutionState,
    memory: &GuestMemory,
    hooks: &mut ExecHooks<'_>,
) -> Result<(), FaultCode> {
    let group = instr.group();
    let dest = resolve_destination(instr, width, memory)?;
    let source_slot = resolve_source_slot(instr, width)?;
    let source = state.read_slot(source_slot, width);

    rmw::execute(
        RmwRequest {
            group,
            width,
            lock: instr.lock,
            dest,
            source,
        },
        state,
        memory,
        hooks.stats,
    )?;
    if let Some(stats) = hooks.stats {
        stats.record(AluEvent::Executed);
    }

    if instr.lock {
        return Ok(());
    }
    if let Some(path) = hooks.path.as_mut() {
        let strategy = emit_alu_path(path, instr.ip, group, width, dest, source_slot);
        if let Some(stats) = hooks.stats {
            stats.record(AluEvent::PathEmitted(strategy));
        }
    }
    Ok(())
}
