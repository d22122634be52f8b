//! Branch instructions for PPU
//!
//! This module contains implementations for PowerPC branch instructions,
//! including conditional and unconditional branches and the condition
//! register logical operations.
//!
//! The machine advances PC before executing, so the address of the branch
//! itself is `pc - 4` and the return address stored by LK is the current PC.

use crate::instruction::CrLogicalOp;
use crate::registers::PpuRegisters;

/// Branch option (BO) field bit masks
pub mod bo_bits {
    /// Don't test the CR bit
    pub const SKIP_CONDITION: u8 = 0b10000;
    /// Branch if the CR bit is set (when tested)
    pub const CONDITION_TRUE: u8 = 0b01000;
    /// Don't decrement CTR
    pub const SKIP_CTR: u8 = 0b00100;
    /// Branch if the decremented CTR is zero (when tested)
    pub const CTR_ZERO: u8 = 0b00010;
}

/// Standard BO encodings
pub mod mnemonics {
    /// Branch always
    pub const BO_ALWAYS: u8 = 0b10100;
    /// Branch if CR bit set (beq, blt, ...)
    pub const BO_IF_TRUE: u8 = 0b01100;
    /// Branch if CR bit clear (bne, bge, ...)
    pub const BO_IF_FALSE: u8 = 0b00100;
    /// Decrement CTR, branch if CTR != 0
    pub const BO_DNZ: u8 = 0b10000;
    /// Decrement CTR, branch if CTR == 0
    pub const BO_DZ: u8 = 0b10010;

    /// CR bit indices within a field
    pub const CR_LT: u8 = 0;
    pub const CR_GT: u8 = 1;
    pub const CR_EQ: u8 = 2;
    pub const CR_SO: u8 = 3;
}

/// CTR half of the branch predicate. Decrements CTR unless BO says not to.
#[inline]
pub fn ctr_condition(regs: &mut PpuRegisters, bo: u8) -> bool {
    if bo & bo_bits::SKIP_CTR != 0 {
        return true;
    }
    regs.ctr = regs.ctr.wrapping_sub(1);
    (regs.ctr == 0) == (bo & bo_bits::CTR_ZERO != 0)
}

/// CR half of the branch predicate
#[inline]
pub fn cr_condition(regs: &PpuRegisters, bo: u8, bi: u8) -> bool {
    if bo & bo_bits::SKIP_CONDITION != 0 {
        return true;
    }
    regs.cr.bit(bi) == (bo & bo_bits::CONDITION_TRUE != 0)
}

/// Evaluate both predicates; CTR is decremented even when the CR test fails
#[inline]
pub fn evaluate_branch_condition(regs: &mut PpuRegisters, bo: u8, bi: u8) -> bool {
    let ctr_ok = ctr_condition(regs, bo);
    let cond_ok = cr_condition(regs, bo, bi);
    ctr_ok && cond_ok
}

#[inline]
fn resolve_target(regs: &PpuRegisters, offset: u32, aa: bool) -> u32 {
    if aa {
        offset
    } else {
        regs.pc.wrapping_sub(4).wrapping_add(offset)
    }
}

/// Execute unconditional branch (b, ba, bl, bla)
pub fn branch(regs: &mut PpuRegisters, offset: u32, aa: bool, lk: bool) {
    let target = resolve_target(regs, offset, aa);
    if lk {
        regs.lr = regs.pc;
    }
    regs.pc = target;
}

/// Execute conditional branch (bc, bca, bcl, bcla)
pub fn branch_conditional(regs: &mut PpuRegisters, bo: u8, bi: u8, offset: u32, aa: bool, lk: bool) {
    let taken = evaluate_branch_condition(regs, bo, bi);
    let target = resolve_target(regs, offset, aa);

    if lk {
        regs.lr = regs.pc;
    }
    if taken {
        regs.pc = target;
    }
}

/// Execute branch conditional to link register (bclr, bclrl)
pub fn branch_conditional_lr(regs: &mut PpuRegisters, bo: u8, bi: u8, lk: bool) {
    let taken = evaluate_branch_condition(regs, bo, bi);
    let target = regs.lr & !3;

    if lk {
        regs.lr = regs.pc;
    }
    if taken {
        regs.pc = target;
    }
}

/// Execute branch conditional to count register (bcctr, bcctrl)
///
/// CTR is never decremented; forms that would are rejected by the decoder.
pub fn branch_conditional_ctr(regs: &mut PpuRegisters, bo: u8, bi: u8, lk: bool) {
    let taken = cr_condition(regs, bo, bi);
    let target = regs.ctr & !3;

    if lk {
        regs.lr = regs.pc;
    }
    if taken {
        regs.pc = target;
    }
}

/// Execute a CR logical operation on CR bits
pub fn cr_logical(regs: &mut PpuRegisters, op: CrLogicalOp, bt: u8, ba: u8, bb: u8) {
    let a = regs.cr.bit(ba);
    let b = regs.cr.bit(bb);
    let result = match op {
        CrLogicalOp::And => a & b,
        CrLogicalOp::Or => a | b,
        CrLogicalOp::Xor => a ^ b,
        CrLogicalOp::Nand => !(a & b),
        CrLogicalOp::Nor => !(a | b),
        CrLogicalOp::Eqv => a == b,
        CrLogicalOp::Andc => a & !b,
        CrLogicalOp::Orc => a | !b,
    };
    regs.cr.set_bit(bt, result);
}

/// mcrf: copy CR field `bfa` into `bf`
pub fn move_cr_field(regs: &mut PpuRegisters, bf: u8, bfa: u8) {
    let value = regs.cr.field(bfa as usize);
    regs.cr.replace_field(bf as usize, value);
}
