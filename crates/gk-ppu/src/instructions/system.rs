//! System instructions for PPU
//!
//! This module contains implementations for PowerPC special-purpose and
//! condition register moves.

use crate::registers::{PpuRegisters, Xer};
use gk_core::error::PpuError;

/// Special Purpose Register numbers
pub mod spr {
    pub const XER: u16 = 1;
    pub const LR: u16 = 8;
    pub const CTR: u16 = 9;
}

/// A special purpose register the interpreter models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spr {
    Xer,
    Lr,
    Ctr,
}

impl Spr {
    /// Decode the 10-bit SPR field of mfspr/mtspr (its two 5-bit halves are swapped)
    pub fn from_field(field: u16) -> Result<Self, PpuError> {
        let number = ((field & 0x1F) << 5) | ((field >> 5) & 0x1F);
        Self::from_number(number)
    }

    pub fn from_number(number: u16) -> Result<Self, PpuError> {
        match number {
            spr::XER => Ok(Self::Xer),
            spr::LR => Ok(Self::Lr),
            spr::CTR => Ok(Self::Ctr),
            _ => Err(PpuError::UnsupportedSpr(number)),
        }
    }

    /// Lowercase register name, as used in mfxer/mtlr/...
    pub fn name(&self) -> &'static str {
        match self {
            Self::Xer => "xer",
            Self::Lr => "lr",
            Self::Ctr => "ctr",
        }
    }
}

/// Read from Special Purpose Register
pub fn mfspr(regs: &mut PpuRegisters, rt: u8, spr: Spr) {
    let value = match spr {
        Spr::Xer => regs.xer.to_value(),
        Spr::Lr => regs.lr,
        Spr::Ctr => regs.ctr,
    };
    regs.set_gpr(rt, value);
}

/// Write to Special Purpose Register
pub fn mtspr(regs: &mut PpuRegisters, spr: Spr, rs: u8) {
    let value = regs.gpr(rs);
    match spr {
        Spr::Xer => regs.xer = Xer::from_value(value),
        Spr::Lr => regs.lr = value,
        Spr::Ctr => regs.ctr = value,
    }
}

/// Move from condition register
pub fn mfcr(regs: &mut PpuRegisters, rt: u8) {
    let value = regs.cr.to_value();
    regs.set_gpr(rt, value);
}

/// Move to condition register fields selected by FXM (bit 7 selects CR0)
pub fn mtcrf(regs: &mut PpuRegisters, fxm: u8, rs: u8) {
    let value = regs.gpr(rs);
    regs.cr.load_from_value(value, fxm);
}
