//! Two-operand integer semantics shared by every table variant.

#![allow(clippy::cast_possible_truncation)]

use super::{AluGroup, OperandWidth};
use crate::Flags;

/// Raw outcome of one ALU evaluation before any flag is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AluOutcome {
    /// Value written back to the destination (`cmp` keeps the destination).
    pub value: u64,
    /// Value the result flags are derived from.
    pub result: u64,
    pub carry: bool,
    pub overflow: bool,
    pub adjust: bool,
    pub width: OperandWidth,
}

impl AluOutcome {
    const fn logic(value: u64, width: OperandWidth) -> Self {
        Self {
            value,
            result: value,
            carry: false,
            overflow: false,
            adjust: false,
            width,
        }
    }

    /// Writes all six status flags.
    pub(crate) fn commit_all(self, flags: &mut Flags) {
        flags.set(Flags::CF, self.carry);
        flags.set(Flags::PF, even_parity(self.result));
        flags.set(Flags::AF, self.adjust);
        flags.set(Flags::ZF, self.result == 0);
        flags.set(Flags::SF, self.result & self.width.sign_bit() != 0);
        flags.set(Flags::OF, self.overflow);
    }

    /// Writes CF and ZF only.
    pub(crate) fn commit_carry_zero(self, flags: &mut Flags) {
        flags.set(Flags::CF, self.carry);
        flags.set(Flags::ZF, self.result == 0);
    }
}

const fn even_parity(result: u64) -> bool {
    (result & 0xFF).count_ones() % 2 == 0
}

const fn sum_outcome(x: u64, y: u64, carry_in: bool, width: OperandWidth) -> AluOutcome {
    let mask = width.mask();
    let wide = x as u128 + y as u128 + carry_in as u128;
    let result = (wide as u64) & mask;
    AluOutcome {
        value: result,
        result,
        carry: wide > mask as u128,
        overflow: (x ^ result) & (y ^ result) & width.sign_bit() != 0,
        adjust: (x ^ y ^ result) & 0x10 != 0,
        width,
    }
}

const fn difference_outcome(x: u64, y: u64, borrow_in: bool, width: OperandWidth) -> AluOutcome {
    let mask = width.mask();
    let result = x.wrapping_sub(y).wrapping_sub(borrow_in as u64) & mask;
    AluOutcome {
        value: result,
        result,
        carry: (x as u128) < y as u128 + borrow_in as u128,
        overflow: (x ^ y) & (x ^ result) & width.sign_bit() != 0,
        adjust: (x ^ y ^ result) & 0x10 != 0,
        width,
    }
}

/// Evaluates `group` on `x` and `y` at `width`.
///
/// Operands are truncated to the width first. `carry_in` is only read by
/// `adc` and `sbb`.
pub(crate) const fn evaluate(
    group: AluGroup,
    width: OperandWidth,
    carry_in: bool,
    x: u64,
    y: u64,
) -> AluOutcome {
    let x = x & width.mask();
    let y = y & width.mask();
    match group {
        AluGroup::Add => sum_outcome(x, y, false, width),
        AluGroup::Adc => sum_outcome(x, y, carry_in, width),
        AluGroup::Sub => difference_outcome(x, y, false, width),
        AluGroup::Sbb => difference_outcome(x, y, carry_in, width),
        AluGroup::Cmp => {
            let mut outcome = difference_outcome(x, y, false, width);
            outcome.value = x;
            outcome
        }
        AluGroup::Or => AluOutcome::logic(x | y, width),
        AluGroup::And => AluOutcome::logic(x & y, width),
        AluGroup::Xor => AluOutcome::logic(x ^ y, width),
    }
}

const fn width_of(bits: u32) -> OperandWidth {
    match OperandWidth::from_bits(bits) {
        Some(width) => width,
        None => panic!("ALU table instantiated with a non-native width"),
    }
}

/// Full variant: computes the result and all six status flags.
pub(crate) fn full<const GROUP: u8, const BITS: u32>(flags: &mut Flags, x: u64, y: u64) -> u64 {
    let outcome = evaluate(
        AluGroup::from_index(GROUP),
        width_of(BITS),
        flags.contains(Flags::CF),
        x,
        y,
    );
    outcome.commit_all(flags);
    outcome.value
}

/// Carry/zero variant: computes the result, CF and ZF; other flags keep
/// their previous value.
pub(crate) fn carry_zero<const GROUP: u8, const BITS: u32>(
    flags: &mut Flags,
    x: u64,
    y: u64,
) -> u64 {
    let outcome = evaluate(
        AluGroup::from_index(GROUP),
        width_of(BITS),
        flags.contains(Flags::CF),
        x,
        y,
    );
    outcome.commit_carry_zero(flags);
    outcome.value
}

/// Plain variant: result only, no flag bookkeeping.
pub(crate) fn plain<const GROUP: u8, const BITS: u32>(flags: Flags, x: u64, y: u64) -> u64 {
    evaluate(
        AluGroup::from_index(GROUP),
        width_of(BITS),
        flags.contains(Flags::CF),
        x,
        y,
    )
    .value
}

#[cfg(test)]
mod tests {
    use super::{evaluate, even_parity};
    use crate::{AluGroup, OperandWidth};

    #[test]
    fn parity_counts_low_byte_only() {
        assert!(even_parity(0xF0));
        assert!(!even_parity(0x01));
        assert!(even_parity(0x0100));
        assert!(even_parity(0));
    }

    #[test]
    fn adc_carry_in_can_produce_carry_out() {
        let out = evaluate(AluGroup::Adc, OperandWidth::Byte, true, 0xFF, 0x00);
        assert_eq!(out.value, 0x00);
        assert!(out.carry);
        assert!(out.adjust);

        let out = evaluate(AluGroup::Adc, OperandWidth::Qword, true, u64::MAX, u64::MAX);
        assert_eq!(out.value, u64::MAX);
        assert!(out.carry);
    }

    #[test]
    fn sbb_borrow_in_can_produce_borrow_out() {
        let out = evaluate(AluGroup::Sbb, OperandWidth::Word, true, 0x0000, 0xFFFF);
        assert_eq!(out.value, 0x0000);
        assert!(out.carry);

        let out = evaluate(AluGroup::Sbb, OperandWidth::Dword, true, 5, 4);
        assert_eq!(out.value, 0);
        assert!(!out.carry);
    }

    #[test]
    fn signed_overflow_follows_operand_signs() {
        let out = evaluate(AluGroup::Add, OperandWidth::Byte, false, 0x7F, 0x01);
        assert_eq!(out.value, 0x80);
        assert!(out.overflow);
        assert!(!out.carry);

        let out = evaluate(AluGroup::Sub, OperandWidth::Byte, false, 0x80, 0x01);
        assert_eq!(out.value, 0x7F);
        assert!(out.overflow);

        let out = evaluate(AluGroup::Sub, OperandWidth::Qword, false, 0, 1);
        assert_eq!(out.value, u64::MAX);
        assert!(out.carry);
        assert!(!out.overflow);
    }

    #[test]
    fn cmp_keeps_destination_but_reports_difference() {
        let out = evaluate(AluGroup::Cmp, OperandWidth::Word, false, 0x0003, 0x0005);
        assert_eq!(out.value, 0x0003);
        assert_eq!(out.result, 0xFFFE);
        assert!(out.carry);
    }

    #[test]
    fn logic_ops_clear_carry_and_overflow() {
        for group in [AluGroup::Or, AluGroup::And, AluGroup::Xor] {
            let out = evaluate(group, OperandWidth::Dword, true, 0xFFFF_FFFF, 0x8000_0001);
            assert!(!out.carry);
            assert!(!out.overflow);
            assert!(!out.adjust);
        }
    }

    #[test]
    fn operands_are_truncated_before_evaluation() {
        let out = evaluate(AluGroup::Add, OperandWidth::Byte, false, 0x1FF, 0x101);
        assert_eq!(out.value, 0x00);
        assert!(out.carry);
    }
}
