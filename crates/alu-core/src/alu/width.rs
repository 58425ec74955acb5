/// Operand width of an ALU instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandWidth {
    /// 8-bit operands.
    Byte,
    /// 16-bit operands.
    Word,
    /// 32-bit operands.
    Dword,
    /// 64-bit operands.
    Qword,
}

impl OperandWidth {
    /// All widths in table-column order.
    pub const ALL: [Self; 4] = [Self::Byte, Self::Word, Self::Dword, Self::Qword];

    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::Word => 16,
            Self::Dword => 32,
            Self::Qword => 64,
        }
    }

    /// Width in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
            Self::Qword => 8,
        }
    }

    /// Table column: log2 of the byte width.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Byte => 0,
            Self::Word => 1,
            Self::Dword => 2,
            Self::Qword => 3,
        }
    }

    /// Width for a bit count, if it is one of the native widths.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::Byte),
            16 => Some(Self::Word),
            32 => Some(Self::Dword),
            64 => Some(Self::Qword),
            _ => None,
        }
    }

    /// Mask selecting the low `bits()` bits.
    #[must_use]
    pub const fn mask(self) -> u64 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Dword => 0xFFFF_FFFF,
            Self::Qword => u64::MAX,
        }
    }

    /// Most significant bit of a value at this width.
    #[must_use]
    pub const fn sign_bit(self) -> u64 {
        1 << (self.bits() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::OperandWidth;

    #[test]
    fn widths_are_consistent() {
        for (column, width) in OperandWidth::ALL.into_iter().enumerate() {
            assert_eq!(width.index(), column);
            assert_eq!(width.bytes() * 8, width.bits() as usize);
            assert_eq!(OperandWidth::from_bits(width.bits()), Some(width));
            assert_eq!(width.mask().count_ones(), width.bits());
            assert_eq!(width.sign_bit() << 1 & width.mask(), 0);
        }
        assert_eq!(OperandWidth::from_bits(12), None);
    }
}
