//! PPU interpreter implementation
//!
//! This module implements the PPU instruction interpreter, dispatching decoded
//! instructions to the appropriate handlers in the instruction modules.

use crate::instruction::Instruction;
use crate::instructions::{branch, compare, integer, load_store, system};
use crate::machine::Machine;
use gk_core::error::PpuError;

/// PPU interpreter for instruction execution
pub struct PpuInterpreter;

impl PpuInterpreter {
    /// Execute a decoded instruction against the machine state.
    ///
    /// PC has already been advanced past the instruction; branches overwrite it.
    #[inline]
    pub fn execute(instruction: &Instruction, machine: &mut Machine) -> Result<(), PpuError> {
        let regs = &mut machine.regs;

        match *instruction {
            Instruction::Branch { offset, aa, lk } => branch::branch(regs, offset, aa, lk),
            Instruction::BranchConditional {
                bo,
                bi,
                offset,
                aa,
                lk,
            } => branch::branch_conditional(regs, bo, bi, offset, aa, lk),
            Instruction::BranchConditionalToLr { bo, bi, lk } => {
                branch::branch_conditional_lr(regs, bo, bi, lk)
            }
            Instruction::BranchConditionalToCtr { bo, bi, lk } => {
                branch::branch_conditional_ctr(regs, bo, bi, lk)
            }
            Instruction::CrLogical { op, bt, ba, bb } => branch::cr_logical(regs, op, bt, ba, bb),
            Instruction::MoveCrField { bf, bfa } => branch::move_cr_field(regs, bf, bfa),

            Instruction::Compare { kind, bf, ra, rhs } => compare::compare(regs, kind, bf, ra, rhs),

            Instruction::ArithmeticImmediate { op, rt, ra, imm } => {
                integer::arithmetic_immediate(regs, op, rt, ra, imm)
            }
            Instruction::Arithmetic {
                op,
                rt,
                ra,
                rb,
                oe,
                rc,
            } => integer::arithmetic(regs, op, rt, ra, rb, oe, rc)?,
            Instruction::LogicalImmediate { op, rs, ra, imm } => {
                integer::logical_immediate(regs, op, rs, ra, imm)
            }
            Instruction::Logical { op, rs, ra, rb, rc } => integer::logical(regs, op, rs, ra, rb, rc),
            Instruction::Unary { op, rs, ra, rc } => integer::unary(regs, op, rs, ra, rc),
            Instruction::Shift { op, rs, ra, rb, rc } => integer::shift(regs, op, rs, ra, rb, rc),
            Instruction::ShiftRightAlgebraicImmediate { rs, ra, sh, rc } => {
                integer::shift_right_algebraic_immediate(regs, rs, ra, sh, rc)
            }
            Instruction::Rotate {
                op,
                rs,
                ra,
                sh,
                mb,
                me,
                rc,
            } => integer::rotate(regs, op, rs, ra, sh, mb, me, rc),

            Instruction::Load {
                kind,
                rt,
                ea,
                update,
            } => load_store::load(regs, &machine.memory, kind, rt, ea, update)?,
            Instruction::Store {
                kind,
                rs,
                ea,
                update,
            } => load_store::store(regs, &mut machine.memory, kind, rs, ea, update)?,
            Instruction::LoadMultiple { rt, ra, d } => {
                load_store::load_multiple(regs, &machine.memory, rt, ra, d)?
            }
            Instruction::StoreMultiple { rs, ra, d } => {
                load_store::store_multiple(regs, &mut machine.memory, rs, ra, d)?
            }

            Instruction::MoveFromSpr { rt, spr } => system::mfspr(regs, rt, spr),
            Instruction::MoveToSpr { spr, rs } => system::mtspr(regs, spr, rs),
            Instruction::MoveFromCr { rt } => system::mfcr(regs, rt),
            Instruction::MoveToCrFields { fxm, rs } => system::mtcrf(regs, fxm, rs),

            // No caches or other processors are modelled
            Instruction::Sync | Instruction::Isync => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_core::error::MemoryError;
    use gk_memory::{MemoryRegion, MemorySystem};

    const BASE: u32 = 0x8000_0000;

    fn create_test_env() -> Machine {
        let memory = MemorySystem::new(&[MemoryRegion {
            cached_base: BASE,
            uncached_base: 0xC000_0000,
            size: 0x1_0000,
        }])
        .unwrap();
        let mut machine = Machine::new(memory);
        machine.set_pc(BASE);
        machine
    }

    /// Helper to write an instruction at PC and execute it
    fn execute_instruction(machine: &mut Machine, opcode: u32) -> Result<Instruction, PpuError> {
        let pc = machine.pc();
        machine.memory_mut().write_be32(pc, opcode).unwrap();
        machine.step()
    }

    // ===== ADDI Tests =====

    #[test]
    fn test_addi_basic() {
        let mut machine = create_test_env();
        // addi r3, r0, 100
        execute_instruction(&mut machine, 0x3860_0064).unwrap();
        assert_eq!(machine.regs.gpr(3), 100);
        assert_eq!(machine.pc(), BASE + 4);
    }

    #[test]
    fn test_addi_negative_immediate() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(5, 100);
        // addi r3, r5, -50
        execute_instruction(&mut machine, 0x3865_FFCE).unwrap();
        assert_eq!(machine.regs.gpr(3), 50);
    }

    #[test]
    fn test_addis_ra_zero() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(0, 0xFFFF);
        // lis r3, 0x8000
        execute_instruction(&mut machine, 0x3C60_8000).unwrap();
        assert_eq!(machine.regs.gpr(3), 0x8000_0000);
    }

    // ===== Register arithmetic =====

    #[test]
    fn test_add_record() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(4, 5);
        machine.regs.set_gpr(5, (-8i32) as u32);
        // add. r3, r4, r5
        execute_instruction(&mut machine, 0x7C64_2A15).unwrap();
        assert_eq!(machine.regs.gpr(3), (-3i32) as u32);
        assert!(machine.regs.cr.is_lesser(0));
    }

    #[test]
    fn test_subf_reads_r0() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(0, 10);
        machine.regs.set_gpr(4, 25);
        // subf r3, r0, r4
        execute_instruction(&mut machine, 0x7C60_2050).unwrap();
        assert_eq!(machine.regs.gpr(3), 15);
    }

    #[test]
    fn test_overflow_enable_is_rejected_without_side_effects() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(3, 0x1234);
        machine.regs.set_gpr(4, 1);
        machine.regs.set_gpr(5, 2);
        // addo. r3, r4, r5
        let err = execute_instruction(&mut machine, 0x7C64_2E15).unwrap_err();
        assert_eq!(
            err,
            PpuError::UnsupportedFeature {
                mnemonic: "add",
                feature: "overflow enable (OE=1)"
            }
        );
        assert_eq!(machine.regs.gpr(3), 0x1234);
        assert_eq!(machine.regs.cr.to_value(), 0);
    }

    // ===== LWZ/STW Tests =====

    #[test]
    fn test_stw_lwz_basic() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(3, 0xDEAD_BEEF);
        machine.regs.set_gpr(4, BASE + 0x1000);

        // stw r3, 0(r4)
        execute_instruction(&mut machine, 0x9064_0000).unwrap();
        assert_eq!(machine.memory().read_be32(BASE + 0x1000).unwrap(), 0xDEAD_BEEF);

        // lwz r5, 0(r4)
        execute_instruction(&mut machine, 0x80A4_0000).unwrap();
        assert_eq!(machine.regs.gpr(5), 0xDEAD_BEEF);
    }

    #[test]
    fn test_stwu_stack_frame() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(1, BASE + 0x8000);
        // stwu r1, -16(r1)
        execute_instruction(&mut machine, 0x9421_FFF0).unwrap();
        assert_eq!(machine.regs.gpr(1), BASE + 0x7FF0);
        assert_eq!(machine.memory().read_be32(BASE + 0x7FF0).unwrap(), BASE + 0x8000);
    }

    #[test]
    fn test_load_through_uncached_alias() {
        let mut machine = create_test_env();
        machine.memory_mut().write_be16(BASE + 0x2000, 0x8001).unwrap();
        machine.regs.set_gpr(4, 0xC000_2000);
        // lha r3, 0(r4)
        execute_instruction(&mut machine, 0xA864_0000).unwrap();
        assert_eq!(machine.regs.gpr(3), 0xFFFF_8001);
    }

    #[test]
    fn test_load_fault_propagates() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(4, 0x1000);
        // lwz r3, 0(r4)
        let err = execute_instruction(&mut machine, 0x8064_0000).unwrap_err();
        assert_eq!(
            err,
            PpuError::MemoryFault(MemoryError::OutOfBounds {
                addr: 0x1000,
                len: 4
            })
        );
    }

    // ===== Branches =====

    #[test]
    fn test_bl_then_blr() {
        let mut machine = create_test_env();
        // bl +0x100
        execute_instruction(&mut machine, 0x4800_0101).unwrap();
        assert_eq!(machine.pc(), BASE + 0x100);
        assert_eq!(machine.regs.lr, BASE + 4);

        // blr
        execute_instruction(&mut machine, 0x4E80_0020).unwrap();
        assert_eq!(machine.pc(), BASE + 4);
    }

    #[test]
    fn test_bctr() {
        let mut machine = create_test_env();
        machine.regs.ctr = BASE + 0x400;
        // bctr
        execute_instruction(&mut machine, 0x4E80_0420).unwrap();
        assert_eq!(machine.pc(), BASE + 0x400);
    }

    #[test]
    fn test_cmpw_bne() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(3, 1);
        machine.regs.set_gpr(4, 2);
        // cmpw r3, r4
        execute_instruction(&mut machine, 0x7C03_2000).unwrap();
        assert!(machine.regs.cr.is_lesser(0));
        // bne +0x20
        execute_instruction(&mut machine, 0x4082_0020).unwrap();
        assert_eq!(machine.pc(), BASE + 4 + 0x20);
    }

    // ===== Logical / rotate =====

    #[test]
    fn test_mr_and_rlwinm() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(4, 0x1234_5678);
        // mr r3, r4
        execute_instruction(&mut machine, 0x7C83_2378).unwrap();
        assert_eq!(machine.regs.gpr(3), 0x1234_5678);
        // rlwinm r3, r4, 8, 24, 31
        execute_instruction(&mut machine, 0x5483_463E).unwrap();
        assert_eq!(machine.regs.gpr(3), 0x12);
    }

    #[test]
    fn test_andi_records() {
        let mut machine = create_test_env();
        machine.regs.set_gpr(4, 0xF0);
        // andi. r3, r4, 0x0F
        execute_instruction(&mut machine, 0x7083_000F).unwrap();
        assert_eq!(machine.regs.gpr(3), 0);
        assert!(machine.regs.cr.is_equal(0));
    }

    // ===== System =====

    #[test]
    fn test_mflr_mtctr() {
        let mut machine = create_test_env();
        machine.regs.lr = 0x8000_1234;
        // mflr r0
        execute_instruction(&mut machine, 0x7C08_02A6).unwrap();
        // mtctr r0
        execute_instruction(&mut machine, 0x7C09_03A6).unwrap();
        assert_eq!(machine.regs.ctr, 0x8000_1234);
    }

    #[test]
    fn test_sync_is_noop() {
        let mut machine = create_test_env();
        let before = machine.regs.clone();
        // sync
        execute_instruction(&mut machine, 0x7C00_04AC).unwrap();
        // isync
        execute_instruction(&mut machine, 0x4C00_012C).unwrap();
        assert_eq!(machine.regs.gpr, before.gpr);
        assert_eq!(machine.regs.cr, before.cr);
        assert_eq!(machine.pc(), BASE + 8);
    }
}
