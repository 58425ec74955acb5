use super::MicroOp;
use crate::{ExecutionState, FaultCode, GuestMemory, MicroOpSink};

/// Vector-backed [`MicroOpSink`] collecting one compiled path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    ops: Vec<MicroOp>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Emitted operations in order.
    #[must_use]
    pub fn ops(&self) -> &[MicroOp] {
        &self.ops
    }

    /// Returns `true` when nothing has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Hands the operations over.
    #[must_use]
    pub fn into_ops(self) -> Vec<MicroOp> {
        self.ops
    }

    /// Runs the trace with [`super::replay`].
    ///
    /// # Errors
    ///
    /// See [`super::replay`].
    pub fn replay(&self, state: &mut ExecutionState, memory: &GuestMemory) -> Result<(), FaultCode> {
        super::replay(&self.ops, state, memory)
    }
}

impl MicroOpSink for Trace {
    fn emit(&mut self, op: MicroOp) {
        self.ops.push(op);
    }
}

impl MicroOpSink for Vec<MicroOp> {
    fn emit(&mut self, op: MicroOp) {
        self.push(op);
    }
}
