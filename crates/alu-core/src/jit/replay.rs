//! Reference evaluator for emitted micro-op sequences.
//!
//! This is not the compiled-code engine. It gives emitted paths an
//! executable meaning so they can be checked against the interpreter.

use super::{KernelFn, MicroOp, Slot};
use crate::{ExecutionState, FaultCode, GuestMemory};

#[derive(Debug, Default)]
struct Scratch {
    slots: [u64; 4],
    machine: bool,
}

impl Scratch {
    const fn get(&self, slot: Slot) -> u64 {
        self.slots[slot.index()]
    }

    const fn set(&mut self, slot: Slot, value: u64) {
        self.slots[slot.index()] = value;
    }
}

/// Executes `ops` against `state` and `memory` with plain accesses.
///
/// The machine argument is consumed by each call, so every call that reads
/// or writes flags must be preceded by its own `LoadMachine`.
///
/// # Errors
///
/// [`FaultCode::MalformedTrace`] when a kernel that needs the machine
/// argument is called without it, and [`FaultCode::UnmappedMemory`] when a
/// memory operand leaves guest memory.
pub fn replay(
    ops: &[MicroOp],
    state: &mut ExecutionState,
    memory: &GuestMemory,
) -> Result<(), FaultCode> {
    let mut scratch = Scratch::default();
    for op in ops {
        match *op {
            MicroOp::ReadOperand { location, width } => {
                scratch.set(Slot::Res0, location.load(state, memory, width)?);
            }
            MicroOp::ReadRegister { slot, width } => {
                scratch.set(Slot::Res0, state.read_slot(slot, width));
            }
            MicroOp::Move { from, to } => scratch.set(to, scratch.get(from)),
            MicroOp::LoadMachine => scratch.machine = true,
            MicroOp::CallMicroOp(kernel) | MicroOp::CallFunction(kernel) => {
                if kernel.needs_machine() && !scratch.machine {
                    return Err(FaultCode::MalformedTrace);
                }
                scratch.machine = false;
                let x = scratch.get(Slot::Arg1);
                let y = scratch.get(Slot::Arg2);
                let z = match kernel.resolve() {
                    KernelFn::Plain(f) => f(state.flags(), x, y),
                    KernelFn::CarryZero(f) => f(state.flags_mut(), x, y),
                    KernelFn::Full(f) => f(state.flags_mut(), x, y),
                };
                scratch.set(Slot::Res0, z);
            }
            MicroOp::WriteOperand { location, width } => {
                location.store(state, memory, width, scratch.get(Slot::Res0))?;
            }
        }
    }
    Ok(())
}
