//! Load/Store instructions for PPU
//!
//! This module contains implementations for PowerPC load and store
//! instructions, including byte-reversal, update and multiple-word forms.

use crate::instruction::{EffectiveAddress, LoadKind, StoreKind};
use crate::registers::PpuRegisters;
use gk_core::error::PpuError;
use gk_memory::MemorySystem;

/// Calculate effective address for load/store with displacement
#[inline]
pub fn calc_ea_d(regs: &PpuRegisters, ra: u8, d: u32) -> u32 {
    regs.gpr_or_zero(ra).wrapping_add(d)
}

/// Calculate effective address for indexed load/store
#[inline]
pub fn calc_ea_x(regs: &PpuRegisters, ra: u8, rb: u8) -> u32 {
    regs.gpr_or_zero(ra).wrapping_add(regs.gpr(rb))
}

/// Effective address for either addressing mode.
///
/// Update forms are decoded with RA != 0, so the RA|0 rule is the same as
/// reading RA for them.
#[inline]
pub fn effective_address(regs: &PpuRegisters, ea: EffectiveAddress) -> u32 {
    match ea {
        EffectiveAddress::Displacement { ra, d } => calc_ea_d(regs, ra, d),
        EffectiveAddress::Indexed { ra, rb } => calc_ea_x(regs, ra, rb),
    }
}

/// Read a value of the given kind, zero or sign extended to 32 bits
fn read(memory: &MemorySystem, kind: LoadKind, ea: u32) -> Result<u32, PpuError> {
    let value = match kind {
        LoadKind::Byte => memory.read_u8(ea)? as u32,
        LoadKind::Halfword => memory.read_be16(ea)? as u32,
        LoadKind::HalfwordAlgebraic => memory.read_be16(ea)? as i16 as i32 as u32,
        LoadKind::Word => memory.read_be32(ea)?,
        LoadKind::HalfwordByteReversed => memory.read_be16(ea)?.swap_bytes() as u32,
        LoadKind::WordByteReversed => memory.read_be32(ea)?.swap_bytes(),
    };
    Ok(value)
}

fn write(memory: &mut MemorySystem, kind: StoreKind, ea: u32, value: u32) -> Result<(), PpuError> {
    match kind {
        StoreKind::Byte => memory.write_u8(ea, value as u8)?,
        StoreKind::Halfword => memory.write_be16(ea, value as u16)?,
        StoreKind::Word => memory.write_be32(ea, value)?,
        StoreKind::HalfwordByteReversed => memory.write_be16(ea, (value as u16).swap_bytes())?,
        StoreKind::WordByteReversed => memory.write_be32(ea, value.swap_bytes())?,
    }
    Ok(())
}

/// Execute a load. The memory access completes before any register changes.
pub fn load(
    regs: &mut PpuRegisters,
    memory: &MemorySystem,
    kind: LoadKind,
    rt: u8,
    ea: EffectiveAddress,
    update: bool,
) -> Result<(), PpuError> {
    let addr = effective_address(regs, ea);
    let value = read(memory, kind, addr)?;

    regs.set_gpr(rt, value);
    if update {
        regs.set_gpr(ea.ra(), addr);
    }
    Ok(())
}

/// Execute a store. RS is read before an update writes RA.
pub fn store(
    regs: &mut PpuRegisters,
    memory: &mut MemorySystem,
    kind: StoreKind,
    rs: u8,
    ea: EffectiveAddress,
    update: bool,
) -> Result<(), PpuError> {
    let addr = effective_address(regs, ea);
    write(memory, kind, addr, regs.gpr(rs))?;

    if update {
        regs.set_gpr(ea.ra(), addr);
    }
    Ok(())
}

/// Execute lmw: load rt..=r31 from consecutive words.
///
/// The whole range is read at once, so a fault leaves every register untouched.
pub fn load_multiple(
    regs: &mut PpuRegisters,
    memory: &MemorySystem,
    rt: u8,
    ra: u8,
    d: u32,
) -> Result<(), PpuError> {
    let addr = calc_ea_d(regs, ra, d);
    let count = 32 - rt as usize;
    let bytes = memory.read(addr, count * 4)?;

    for (reg, word) in (rt..32).zip(bytes.chunks_exact(4)) {
        regs.set_gpr(reg, u32::from_be_bytes([word[0], word[1], word[2], word[3]]));
    }
    Ok(())
}

/// Execute stmw: store rs..=r31 to consecutive words in a single write
pub fn store_multiple(
    regs: &PpuRegisters,
    memory: &mut MemorySystem,
    rs: u8,
    ra: u8,
    d: u32,
) -> Result<(), PpuError> {
    let addr = calc_ea_d(regs, ra, d);
    let bytes: Vec<u8> = (rs..32).flat_map(|reg| regs.gpr(reg).to_be_bytes()).collect();
    memory.write(addr, &bytes)?;
    Ok(())
}
