use log::trace;

use super::{AluKernel, EmissionStrategy, MicroOp, Slot};
use crate::{AluGroup, Flags, Location, OperandWidth, PathBuilder, RegisterSlot};

/// Appends the micro-op sequence of one unlocked `op r/m, reg` to `path`.
///
/// The prologue is shared by every tier: the destination is read and parked
/// in `sav1`, the source is read and moved to `arg2`, then the destination
/// is moved to `arg1`. The tier decides whether the machine argument is
/// loaded and which kernel is called. `cmp` does not write back.
pub fn emit_alu_path(
    path: &mut PathBuilder<'_>,
    ip: u64,
    group: AluGroup,
    width: OperandWidth,
    dest: Location,
    source: RegisterSlot,
) -> EmissionStrategy {
    let needed = path.flags.needed_flags(ip, Flags::STATUS);
    let strategy = EmissionStrategy::select(needed);
    trace!("path {ip:#x}: {group:?}/{width:?} needs {needed:?}, emitting {strategy:?}");

    let kernel = AluKernel {
        group,
        width,
        variant: strategy.variant(),
    };
    let sink = &mut *path.sink;
    sink.emit(MicroOp::ReadOperand {
        location: dest,
        width,
    });
    sink.emit(MicroOp::Move {
        from: Slot::Res0,
        to: Slot::Sav1,
    });
    sink.emit(MicroOp::ReadRegister {
        slot: source,
        width,
    });
    sink.emit(MicroOp::Move {
        from: Slot::Res0,
        to: Slot::Arg2,
    });
    sink.emit(MicroOp::Move {
        from: Slot::Sav1,
        to: Slot::Arg1,
    });
    if kernel.needs_machine() {
        sink.emit(MicroOp::LoadMachine);
    }
    sink.emit(match strategy {
        EmissionStrategy::Unflagged | EmissionStrategy::CarryZero => MicroOp::CallMicroOp(kernel),
        EmissionStrategy::Full => MicroOp::CallFunction(kernel),
    });
    if group.writes_destination() {
        sink.emit(MicroOp::WriteOperand {
            location: dest,
            width,
        });
    }
    strategy
}
