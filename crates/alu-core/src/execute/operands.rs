//! Operand locations for the `op r/m, reg` forms.

use crate::{
    DecodedInstruction, ExecutionState, FaultCode, GeneralRegister, GuestMemory, OperandWidth,
    RegisterSlot, RmOperand,
};

/// Where an operand lives once addressing has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Location {
    /// A register of the executing context.
    Register(RegisterSlot),
    /// A guest memory address, range-checked for the operand width.
    Memory(u64),
}

impl Location {
    /// Returns `true` for memory operands.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Reads the operand with plain (relaxed) ordering.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnmappedMemory`] for memory outside the guest.
    pub fn load(
        self,
        state: &ExecutionState,
        memory: &GuestMemory,
        width: OperandWidth,
    ) -> Result<u64, FaultCode> {
        match self {
            Self::Register(slot) => Ok(state.read_slot(slot, width)),
            Self::Memory(addr) => memory.read(addr, width),
        }
    }

    /// Writes the operand with plain (relaxed) ordering.
    ///
    /// Doubleword register writes clear bits 32..64.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnmappedMemory`] for memory outside the guest.
    pub fn store(
        self,
        state: &mut ExecutionState,
        memory: &GuestMemory,
        width: OperandWidth,
        value: u64,
    ) -> Result<(), FaultCode> {
        match self {
            Self::Register(slot) => {
                state.write_slot(slot, width, value);
                Ok(())
            }
            Self::Memory(addr) => memory.write(addr, width, value),
        }
    }
}

fn register_slot(bits: u8, width: OperandWidth, rex: bool) -> Result<RegisterSlot, FaultCode> {
    let slot = match width {
        OperandWidth::Byte => RegisterSlot::byte(bits, rex),
        _ => GeneralRegister::from_u4(bits).map(RegisterSlot::full),
    };
    slot.ok_or(FaultCode::InvalidRegister)
}

/// Resolves the `r/m` destination for write access.
///
/// # Errors
///
/// [`FaultCode::InvalidRegister`] for a register field above 15 and
/// [`FaultCode::UnmappedMemory`] when the operand does not fit in guest
/// memory.
pub fn resolve_destination(
    instr: &DecodedInstruction,
    width: OperandWidth,
    memory: &GuestMemory,
) -> Result<Location, FaultCode> {
    match instr.rm {
        RmOperand::Register(bits) => register_slot(bits, width, instr.rex).map(Location::Register),
        RmOperand::Memory(addr) => {
            memory.check_range(addr, width.bytes())?;
            Ok(Location::Memory(addr))
        }
    }
}

/// Resolves the `reg` source register.
///
/// # Errors
///
/// [`FaultCode::InvalidRegister`] for a register field above 15.
pub fn resolve_source_slot(
    instr: &DecodedInstruction,
    width: OperandWidth,
) -> Result<RegisterSlot, FaultCode> {
    register_slot(instr.reg, width, instr.rex)
}

/// Reads the `reg` source value truncated to `width`.
///
/// # Errors
///
/// [`FaultCode::InvalidRegister`] for a register field above 15.
pub fn resolve_source(
    instr: &DecodedInstruction,
    width: OperandWidth,
    state: &ExecutionState,
) -> Result<u64, FaultCode> {
    resolve_source_slot(instr, width).map(|slot| state.read_slot(slot, width))
}

#[cfg(test)]
mod tests {
    use super::{resolve_destination, resolve_source, Location};
    use crate::{
        DecodedInstruction, ExecutionState, FaultCode, GeneralRegister, GuestMemory, OperandWidth,
        RegisterSlot, RmOperand,
    };

    #[test]
    fn byte_destination_without_rex_names_high_register() {
        let memory = GuestMemory::new(16).unwrap();
        let instr = DecodedInstruction::new(0x00, 0, RmOperand::Register(7));
        let location = resolve_destination(&instr, OperandWidth::Byte, &memory).unwrap();
        assert_eq!(
            location,
            Location::Register(RegisterSlot {
                reg: GeneralRegister::Rbx,
                high_byte: true,
            })
        );

        let with_rex = instr.with_rex();
        let location = resolve_destination(&with_rex, OperandWidth::Byte, &memory).unwrap();
        assert_eq!(
            location,
            Location::Register(RegisterSlot::full(GeneralRegister::Rdi))
        );
    }

    #[test]
    fn word_destination_ignores_high_byte_encoding() {
        let memory = GuestMemory::new(16).unwrap();
        let instr = DecodedInstruction::new(0x01, 0, RmOperand::Register(4));
        assert_eq!(
            resolve_destination(&instr, OperandWidth::Dword, &memory).unwrap(),
            Location::Register(RegisterSlot::full(GeneralRegister::Rsp))
        );
    }

    #[test]
    fn contract_breaches_are_reported() {
        let memory = GuestMemory::new(16).unwrap();
        let bad_reg = DecodedInstruction::new(0x01, 0, RmOperand::Register(16));
        assert_eq!(
            resolve_destination(&bad_reg, OperandWidth::Qword, &memory),
            Err(FaultCode::InvalidRegister)
        );

        let bad_addr = DecodedInstruction::new(0x01, 0, RmOperand::Memory(12));
        assert_eq!(
            resolve_destination(&bad_addr, OperandWidth::Qword, &memory),
            Err(FaultCode::UnmappedMemory)
        );
        assert!(resolve_destination(&bad_addr, OperandWidth::Dword, &memory).is_ok());

        let bad_src = DecodedInstruction::new(0x01, 0x1F, RmOperand::Memory(0));
        assert_eq!(
            resolve_source(&bad_src, OperandWidth::Word, &ExecutionState::default()),
            Err(FaultCode::InvalidRegister)
        );
    }

    #[test]
    fn source_is_truncated_to_width() {
        let mut state = ExecutionState::default();
        state.set_gpr(GeneralRegister::Rdx, 0x1122_3344_5566_7788);
        let instr = DecodedInstruction::new(0x01, 2, RmOperand::Memory(0));
        assert_eq!(
            resolve_source(&instr, OperandWidth::Word, &state).unwrap(),
            0x7788
        );
        assert_eq!(
            resolve_source(&instr, OperandWidth::Byte, &state).unwrap(),
            0x88
        );
        let high = DecodedInstruction::new(0x00, 6, RmOperand::Memory(0));
        assert_eq!(
            resolve_source(&high, OperandWidth::Byte, &state).unwrap(),
            0x77
        );
    }

    #[test]
    fn doubleword_register_store_clears_upper_half() {
        let memory = GuestMemory::new(16).unwrap();
        let mut state = ExecutionState::default();
        state.set_gpr(GeneralRegister::Rcx, u64::MAX);
        let location = Location::Register(RegisterSlot::full(GeneralRegister::Rcx));
        location
            .store(&mut state, &memory, OperandWidth::Dword, 0x1234)
            .unwrap();
        assert_eq!(state.gpr(GeneralRegister::Rcx), 0x1234);
        assert!(!location.is_memory());
        assert!(Location::Memory(0).is_memory());
    }
}
