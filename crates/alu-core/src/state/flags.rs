//! RFLAGS value and flag-set arithmetic.

use bitflags::bitflags;

bitflags! {
    /// Emulated RFLAGS register value, also used as a set of flags.
    ///
    /// Bit positions follow the x86 layout so the value can be handed to other
    /// parts of the emulator unchanged. Bits without a name here (IF, DF, ...)
    /// are carried through untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct Flags: u64 {
        /// Carry flag.
        const CF = 1 << 0;
        /// Architecturally reserved bit, reads as one.
        const RESERVED = 1 << 1;
        /// Parity flag (even parity of the low result byte).
        const PF = 1 << 2;
        /// Auxiliary (nibble) carry flag.
        const AF = 1 << 4;
        /// Zero flag.
        const ZF = 1 << 6;
        /// Sign flag.
        const SF = 1 << 7;
        /// Overflow flag.
        const OF = 1 << 11;

        const _ = !0;
    }
}

impl Flags {
    /// The six status flags written by the ALU group.
    pub const STATUS: Self = Self::CF
        .union(Self::PF)
        .union(Self::AF)
        .union(Self::ZF)
        .union(Self::SF)
        .union(Self::OF);
}

#[cfg(test)]
mod tests {
    use super::Flags;

    #[test]
    fn status_flags_use_x86_bit_positions() {
        assert_eq!(Flags::CF.bits(), 0x001);
        assert_eq!(Flags::PF.bits(), 0x004);
        assert_eq!(Flags::AF.bits(), 0x010);
        assert_eq!(Flags::ZF.bits(), 0x040);
        assert_eq!(Flags::SF.bits(), 0x080);
        assert_eq!(Flags::OF.bits(), 0x800);
        assert_eq!(Flags::STATUS.bits(), 0x8D5);
        assert!(!Flags::STATUS.contains(Flags::RESERVED));
    }

    #[test]
    fn set_only_touches_masked_bits() {
        let mut flags = Flags::RESERVED | Flags::OF;
        flags.set(Flags::CF | Flags::ZF, true);
        assert!(flags.contains(Flags::CF | Flags::ZF | Flags::OF | Flags::RESERVED));

        flags.set(Flags::OF | Flags::CF, false);
        assert_eq!(flags, Flags::RESERVED | Flags::ZF);
    }

    #[test]
    fn unnamed_rflags_bits_survive_status_updates() {
        // IF and DF.
        let system = Flags::from_bits_retain(0x200 | 0x400);
        let mut flags = system | Flags::RESERVED;
        flags.set(Flags::STATUS, true);
        flags.set(Flags::CF | Flags::OF, false);
        assert!(flags.contains(system));
        assert_eq!(flags & Flags::STATUS, Flags::PF | Flags::AF | Flags::ZF | Flags::SF);
        assert_eq!(Flags::from_bits_truncate(u64::MAX) & Flags::STATUS, Flags::STATUS);
    }
}
