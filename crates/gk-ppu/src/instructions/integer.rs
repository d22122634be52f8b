//! Integer arithmetic instructions for PPU
//!
//! This module contains implementations for PowerPC integer arithmetic,
//! logical, shift, and rotate instructions, along with the 32-bit helpers
//! they are built from.

use crate::instruction::{ArithOp, ImmArithOp, LogicalImmOp, LogicalOp, RotateOp, ShiftOp, UnaryOp};
use crate::registers::PpuRegisters;
use gk_core::error::PpuError;

/// Sign extend the low 14 bits
#[inline]
pub fn sign_extend_14(value: u32) -> u32 {
    (((value << 18) as i32) >> 18) as u32
}

/// Sign extend the low 16 bits
#[inline]
pub fn sign_extend_16(value: u32) -> u32 {
    value as u16 as i16 as i32 as u32
}

/// Sign extend the low 24 bits
#[inline]
pub fn sign_extend_24(value: u32) -> u32 {
    (((value << 8) as i32) >> 8) as u32
}

/// 32-bit wrapping add
#[inline]
pub fn add_32bit(a: u32, b: u32) -> u32 {
    a.wrapping_add(b)
}

/// 32-bit add returning the carry out
#[inline]
pub fn add_32bit_overflow(a: u32, b: u32) -> (u32, bool) {
    a.overflowing_add(b)
}

/// Add with carry in, returning the carry out
#[inline]
pub fn add_with_carry(a: u32, b: u32, carry_in: bool) -> (u32, bool) {
    let (result1, carry1) = a.overflowing_add(b);
    let (result2, carry2) = result1.overflowing_add(carry_in as u32);
    (result2, carry1 || carry2)
}

/// 32-bit two's complement
#[inline]
pub fn negate(value: u32) -> u32 {
    value.wrapping_neg()
}

#[inline]
pub fn to_signed(value: u32) -> i32 {
    value as i32
}

#[inline]
pub fn from_signed(value: i32) -> u32 {
    value as u32
}

/// Generate 32-bit mask for rotate instructions (MSB-first, wraps when mb > me)
#[inline]
pub fn generate_mask_32(mb: u8, me: u8) -> u32 {
    let mb = mb as u32 & 31;
    let me = me as u32 & 31;
    if mb <= me {
        (u32::MAX >> mb) & (u32::MAX << (31 - me))
    } else {
        (u32::MAX >> mb) | (u32::MAX << (31 - me))
    }
}

/// Reject overflow-enabled forms before any state changes
#[inline]
fn reject_oe(op: ArithOp, oe: bool) -> Result<(), PpuError> {
    if oe {
        return Err(PpuError::UnsupportedFeature {
            mnemonic: arith_mnemonic(op),
            feature: "overflow enable (OE=1)",
        });
    }
    Ok(())
}

fn arith_mnemonic(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "add",
        ArithOp::Addc => "addc",
        ArithOp::Adde => "adde",
        ArithOp::Addze => "addze",
        ArithOp::Addme => "addme",
        ArithOp::Subf => "subf",
        ArithOp::Subfc => "subfc",
        ArithOp::Subfe => "subfe",
        ArithOp::Subfze => "subfze",
        ArithOp::Subfme => "subfme",
        ArithOp::Neg => "neg",
        ArithOp::Mullw => "mullw",
        ArithOp::Mulhw => "mulhw",
        ArithOp::Mulhwu => "mulhwu",
        ArithOp::Divw => "divw",
        ArithOp::Divwu => "divwu",
    }
}

/// Execute addi, addis, addic, addic., subfic, mulli
pub fn arithmetic_immediate(regs: &mut PpuRegisters, op: ImmArithOp, rt: u8, ra: u8, imm: u32) {
    let result = match op {
        ImmArithOp::Addi => add_32bit(regs.gpr_or_zero(ra), imm),
        ImmArithOp::Addis => add_32bit(regs.gpr_or_zero(ra), imm << 16),
        ImmArithOp::Addic | ImmArithOp::AddicRecord => {
            let (result, carry) = add_32bit_overflow(regs.gpr(ra), imm);
            regs.xer.set_ca(carry);
            result
        }
        ImmArithOp::Subfic => {
            let (result, carry) = add_with_carry(!regs.gpr(ra), imm, true);
            regs.xer.set_ca(carry);
            result
        }
        ImmArithOp::Mulli => (regs.gpr(ra) as i32).wrapping_mul(imm as i32) as u32,
    };

    regs.set_gpr(rt, result);
    if op == ImmArithOp::AddicRecord {
        regs.record_cr0(result);
    }
}

/// Execute an XO-form arithmetic instruction
pub fn arithmetic(
    regs: &mut PpuRegisters,
    op: ArithOp,
    rt: u8,
    ra: u8,
    rb: u8,
    oe: bool,
    rc: bool,
) -> Result<(), PpuError> {
    reject_oe(op, oe)?;

    let a = regs.gpr(ra);
    let b = regs.gpr(rb);
    let ca = regs.xer.ca();

    let (result, carry) = match op {
        ArithOp::Add => (add_32bit(a, b), None),
        ArithOp::Addc => {
            let (r, c) = add_32bit_overflow(a, b);
            (r, Some(c))
        }
        ArithOp::Adde => {
            let (r, c) = add_with_carry(a, b, ca);
            (r, Some(c))
        }
        ArithOp::Addze => {
            let (r, c) = add_with_carry(a, 0, ca);
            (r, Some(c))
        }
        ArithOp::Addme => {
            let (r, c) = add_with_carry(a, u32::MAX, ca);
            (r, Some(c))
        }
        ArithOp::Subf => (add_32bit(!a, add_32bit(b, 1)), None),
        ArithOp::Subfc => {
            let (r, c) = add_with_carry(!a, b, true);
            (r, Some(c))
        }
        ArithOp::Subfe => {
            let (r, c) = add_with_carry(!a, b, ca);
            (r, Some(c))
        }
        ArithOp::Subfze => {
            let (r, c) = add_with_carry(!a, 0, ca);
            (r, Some(c))
        }
        ArithOp::Subfme => {
            let (r, c) = add_with_carry(!a, u32::MAX, ca);
            (r, Some(c))
        }
        ArithOp::Neg => (negate(a), None),
        ArithOp::Mullw => (a.wrapping_mul(b), None),
        ArithOp::Mulhw => (((a as i32 as i64 * b as i32 as i64) >> 32) as u32, None),
        ArithOp::Mulhwu => (((a as u64 * b as u64) >> 32) as u32, None),
        // Undefined results in hardware; zero keeps the interpreter deterministic
        ArithOp::Divw => {
            let result = (a as i32).checked_div(b as i32).unwrap_or(0);
            (result as u32, None)
        }
        ArithOp::Divwu => (a.checked_div(b).unwrap_or(0), None),
    };

    regs.set_gpr(rt, result);
    if let Some(carry) = carry {
        regs.xer.set_ca(carry);
    }
    if rc {
        regs.record_cr0(result);
    }
    Ok(())
}

/// Execute ori, oris, xori, xoris, andi., andis.
pub fn logical_immediate(regs: &mut PpuRegisters, op: LogicalImmOp, rs: u8, ra: u8, imm: u32) {
    let s = regs.gpr(rs);
    let result = match op {
        LogicalImmOp::Ori => s | imm,
        LogicalImmOp::Oris => s | (imm << 16),
        LogicalImmOp::Xori => s ^ imm,
        LogicalImmOp::Xoris => s ^ (imm << 16),
        LogicalImmOp::Andi => s & imm,
        LogicalImmOp::Andis => s & (imm << 16),
    };

    regs.set_gpr(ra, result);
    if matches!(op, LogicalImmOp::Andi | LogicalImmOp::Andis) {
        regs.record_cr0(result);
    }
}

/// Execute an X-form register-register logical instruction
pub fn logical(regs: &mut PpuRegisters, op: LogicalOp, rs: u8, ra: u8, rb: u8, rc: bool) {
    let s = regs.gpr(rs);
    let b = regs.gpr(rb);
    let result = match op {
        LogicalOp::And => s & b,
        LogicalOp::Andc => s & !b,
        LogicalOp::Or => s | b,
        LogicalOp::Orc => s | !b,
        LogicalOp::Xor => s ^ b,
        LogicalOp::Nand => !(s & b),
        LogicalOp::Nor => !(s | b),
        LogicalOp::Eqv => !(s ^ b),
    };

    regs.set_gpr(ra, result);
    if rc {
        regs.record_cr0(result);
    }
}

/// Execute extsb, extsh, cntlzw
pub fn unary(regs: &mut PpuRegisters, op: UnaryOp, rs: u8, ra: u8, rc: bool) {
    let s = regs.gpr(rs);
    let result = match op {
        UnaryOp::Extsb => s as u8 as i8 as i32 as u32,
        UnaryOp::Extsh => sign_extend_16(s),
        UnaryOp::Cntlzw => s.leading_zeros(),
    };

    regs.set_gpr(ra, result);
    if rc {
        regs.record_cr0(result);
    }
}

/// Arithmetic right shift setting CA when a negative value loses 1 bits
#[inline]
fn shift_right_algebraic(value: u32, amount: u32) -> (u32, bool) {
    let negative = (value as i32) < 0;
    if amount >= 32 {
        let result = if negative { u32::MAX } else { 0 };
        return (result, negative);
    }
    let result = ((value as i32) >> amount) as u32;
    let lost = value & ((1u32 << amount) - 1);
    (result, negative && lost != 0)
}

/// Execute slw, srw, sraw. The amount is the low 6 bits of RB.
pub fn shift(regs: &mut PpuRegisters, op: ShiftOp, rs: u8, ra: u8, rb: u8, rc: bool) {
    let s = regs.gpr(rs);
    let amount = regs.gpr(rb) & 0x3F;

    let result = match op {
        ShiftOp::Slw => s.checked_shl(amount).unwrap_or(0),
        ShiftOp::Srw => s.checked_shr(amount).unwrap_or(0),
        ShiftOp::Sraw => {
            let (result, carry) = shift_right_algebraic(s, amount);
            regs.xer.set_ca(carry);
            result
        }
    };

    regs.set_gpr(ra, result);
    if rc {
        regs.record_cr0(result);
    }
}

/// Execute srawi
pub fn shift_right_algebraic_immediate(regs: &mut PpuRegisters, rs: u8, ra: u8, sh: u8, rc: bool) {
    let (result, carry) = shift_right_algebraic(regs.gpr(rs), sh as u32);
    regs.xer.set_ca(carry);
    regs.set_gpr(ra, result);
    if rc {
        regs.record_cr0(result);
    }
}

/// Execute rlwimi, rlwinm, rlwnm
#[allow(clippy::too_many_arguments)]
pub fn rotate(regs: &mut PpuRegisters, op: RotateOp, rs: u8, ra: u8, sh: u8, mb: u8, me: u8, rc: bool) {
    let amount = match op {
        RotateOp::Rlwnm => regs.gpr(sh) & 0x1F,
        RotateOp::Rlwimi | RotateOp::Rlwinm => sh as u32,
    };
    let rotated = regs.gpr(rs).rotate_left(amount);
    let mask = generate_mask_32(mb, me);

    let result = match op {
        RotateOp::Rlwimi => (rotated & mask) | (regs.gpr(ra) & !mask),
        RotateOp::Rlwinm | RotateOp::Rlwnm => rotated & mask,
    };

    regs.set_gpr(ra, result);
    if rc {
        regs.record_cr0(result);
    }
}
