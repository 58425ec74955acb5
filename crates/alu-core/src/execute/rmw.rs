//! Read-modify-write protocol for the ALU group.
//!
//! Unlocked instructions and register destinations run as a plain load,
//! compute, store. Locked memory destinations either run a native
//! compare-and-swap loop on the containing cell or, when the access is
//! misaligned or wider than a cell, run under the exclusive bus lock.

use std::sync::atomic::Ordering;

use log::trace;

use super::operands::Location;
use crate::memory::cells::{extract, insert};
use crate::{
    alu_fn, AluEvent, AluGroup, AluStats, ExecutionState, FaultCode, GuestMemory, OperandWidth,
};

/// One ALU operation with its resolved operands.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RmwRequest {
    pub group: AluGroup,
    pub width: OperandWidth,
    pub lock: bool,
    pub dest: Location,
    pub source: u64,
}

/// Performs `request` with the protocol its destination and prefix call for.
pub(crate) fn execute(
    request: RmwRequest,
    state: &mut ExecutionState,
    memory: &GuestMemory,
    stats: Option<&dyn AluStats>,
) -> Result<(), FaultCode> {
    match request.dest {
        Location::Memory(addr) if request.lock => {
            if memory.is_native_atomic(addr, request.width) {
                let retries = locked_native(request, addr, state, memory)?;
                if let Some(stats) = stats {
                    stats.record(AluEvent::LockedNative);
                    if retries > 0 {
                        stats.record(AluEvent::CasRetries(retries));
                    }
                }
            } else {
                trace!(
                    "locked {:?}/{:?} at {addr:#x} takes the bus lock",
                    request.group,
                    request.width
                );
                locked_bus(request, addr, state, memory)?;
                if let Some(stats) = stats {
                    stats.record(AluEvent::LockedBus);
                }
            }
            Ok(())
        }
        _ => unlocked(request, state, memory),
    }
}

fn unlocked(
    request: RmwRequest,
    state: &mut ExecutionState,
    memory: &GuestMemory,
) -> Result<(), FaultCode> {
    let RmwRequest {
        group,
        width,
        dest,
        source,
        ..
    } = request;
    let x = dest.load(state, memory, width)?;
    let z = alu_fn(group, width)(state.flags_mut(), x, source);
    if group.writes_destination() {
        dest.store(state, memory, width, z)?;
    }
    Ok(())
}

/// Compare-and-swap loop on the cell containing `addr`.
///
/// Returns the number of failed attempts. Flags of the successful attempt
/// are committed.
///
/// The loop runs under the shared bus guard, so it waits for any bus-locked
/// access in flight; removing the guard lets a misaligned locked access
/// tear across this cell.
fn locked_native(
    request: RmwRequest,
    addr: u64,
    state: &mut ExecutionState,
    memory: &GuestMemory,
) -> Result<u32, FaultCode> {
    let RmwRequest {
        group,
        width,
        source,
        ..
    } = request;
    let start = memory.check_range(addr, width.bytes())?;
    let (cell, shift) = memory.cell(start);
    let f = alu_fn(group, width);

    let _bus = memory.bus().shared();
    let mut current = cell.load(Ordering::Acquire);
    let mut retries = 0_u32;
    loop {
        let mut flags = state.flags();
        let z = f(&mut flags, extract(current, shift, width), source);
        if !group.writes_destination() {
            state.set_flags(flags);
            return Ok(retries);
        }
        let next = insert(current, shift, width, z);
        match cell.compare_exchange_weak(current, next, Ordering::Release, Ordering::Acquire) {
            Ok(_) => {
                state.set_flags(flags);
                return Ok(retries);
            }
            Err(observed) => {
                current = observed;
                retries = retries.saturating_add(1);
            }
        }
    }
}

/// Plain load, compute, store while holding the exclusive bus lock.
fn locked_bus(
    request: RmwRequest,
    addr: u64,
    state: &mut ExecutionState,
    memory: &GuestMemory,
) -> Result<(), FaultCode> {
    let RmwRequest {
        group,
        width,
        source,
        ..
    } = request;
    let start = memory.check_range(addr, width.bytes())?;

    let _bus = memory.bus().exclusive();
    let x = memory.read_checked(start, width);
    let z = alu_fn(group, width)(state.flags_mut(), x, source);
    if group.writes_destination() {
        memory.write_checked(start, width, z);
    }
    Ok(())
}
