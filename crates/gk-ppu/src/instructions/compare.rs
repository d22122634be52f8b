//! Compare instructions for PPU

use crate::instruction::{CompareKind, Operand};
use crate::registers::PpuRegisters;

/// Execute cmp, cmpl, cmpi, cmpli into CR field `bf`
pub fn compare(regs: &mut PpuRegisters, kind: CompareKind, bf: u8, ra: u8, rhs: Operand) {
    let a = regs.gpr(ra);
    let b = match rhs {
        Operand::Register(rb) => regs.gpr(rb),
        Operand::Immediate(imm) => imm,
    };

    match kind {
        CompareKind::Signed => regs.cr.compare(bf as usize, a as i32, b as i32),
        CompareKind::Logical => regs.cr.compare(bf as usize, a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmpwi_negative() {
        let mut regs = PpuRegisters::default();
        regs.set_gpr(4, (-5i32) as u32);
        compare(&mut regs, CompareKind::Signed, 0, 4, Operand::Immediate((-1i32) as u32));
        assert!(regs.cr.is_lesser(0));
    }

    #[test]
    fn test_cmplwi_is_unsigned() {
        let mut regs = PpuRegisters::default();
        regs.set_gpr(4, 0xFFFF_FFFF);
        compare(&mut regs, CompareKind::Logical, 3, 4, Operand::Immediate(0xFFFF));
        assert!(regs.cr.is_bigger(3));
        assert!(!regs.cr.is_lesser(0));
    }

    #[test]
    fn test_cmpw_equal_keeps_so() {
        let mut regs = PpuRegisters::default();
        regs.set_gpr(3, 42);
        regs.set_gpr(5, 42);
        regs.cr.set_so(7);
        compare(&mut regs, CompareKind::Signed, 7, 3, Operand::Register(5));
        assert!(regs.cr.is_equal(7));
        assert!(regs.cr.is_summary_overflow(7));
    }
}
