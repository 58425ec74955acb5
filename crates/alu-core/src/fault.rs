use thiserror::Error;

/// Fault classes used to decide which collaborator broke its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder handed over an operand the core cannot name.
    Decode,
    /// Memory operand outside the guest address space.
    Memory,
    /// Emitted micro-op sequence does not follow the emission contract.
    Trace,
    /// Host configuration rejected at construction time.
    Config,
}

/// Stable fault taxonomy for collaborator contract breaches.
///
/// None of these are architectural exceptions: they surface programming
/// errors in the decoder, memory manager or trace builder so the
/// surrounding engine can treat them as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Memory operand lies (partly) outside guest memory.
    #[error("memory operand outside guest memory")]
    UnmappedMemory = 0x01,
    /// Register field does not name one of the 16 general registers.
    #[error("register index out of range")]
    InvalidRegister = 0x02,
    /// A flag-writing kernel was called without the machine argument.
    #[error("micro-op sequence calls a flag kernel without machine state")]
    MalformedTrace = 0x03,
    /// Guest memory size is zero or not addressable on this host.
    #[error("guest memory size is not usable on this host")]
    InvalidMemorySize = 0x04,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::UnmappedMemory),
            0x02 => Some(Self::InvalidRegister),
            0x03 => Some(Self::MalformedTrace),
            0x04 => Some(Self::InvalidMemorySize),
            _ => None,
        }
    }

    /// Returns the fault class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UnmappedMemory => FaultClass::Memory,
            Self::InvalidRegister => FaultClass::Decode,
            Self::MalformedTrace => FaultClass::Trace,
            Self::InvalidMemorySize => FaultClass::Config,
        }
    }
}
