//! PPU register file, condition register and XER

use bitflags::bitflags;
use gk_core::error::PpuError;
use std::fmt;

bitflags! {
    /// One 4-bit condition register field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CrFlags: u8 {
        /// Less than
        const LT = 0b1000;
        /// Greater than
        const GT = 0b0100;
        /// Equal
        const EQ = 0b0010;
        /// Summary overflow (sticky)
        const SO = 0b0001;
    }
}

/// Condition register: 8 fields, field 0 in the most significant nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionRegister {
    fields: [CrFlags; 8],
}

impl ConditionRegister {
    /// Build a condition register from its packed value
    pub fn from_value(value: u32) -> Self {
        let mut cr = Self::default();
        cr.load_from_value(value, 0xFF);
        cr
    }

    /// Get a field
    #[inline]
    pub fn field(&self, field: usize) -> CrFlags {
        self.fields[field]
    }

    /// Compare `a` with `b` and record the result in `field`.
    ///
    /// Sets exactly one of LT/GT/EQ. SO is left as it was.
    pub fn compare<T: Ord>(&mut self, field: usize, a: T, b: T) {
        let result = match a.cmp(&b) {
            std::cmp::Ordering::Less => CrFlags::LT,
            std::cmp::Ordering::Greater => CrFlags::GT,
            std::cmp::Ordering::Equal => CrFlags::EQ,
        };
        self.fields[field] = result | (self.fields[field] & CrFlags::SO);
    }

    /// OR the summary overflow bit into `field`
    #[inline]
    pub fn set_so(&mut self, field: usize) {
        self.fields[field] |= CrFlags::SO;
    }

    /// Set `field` to one of 0, LT, GT, EQ or SO.
    ///
    /// SO is sticky: setting `SO` ORs it in, any other value keeps the current SO.
    pub fn set_field(&mut self, field: usize, value: CrFlags) -> Result<(), PpuError> {
        let valid = [
            CrFlags::empty(),
            CrFlags::LT,
            CrFlags::GT,
            CrFlags::EQ,
            CrFlags::SO,
        ];
        if !valid.contains(&value) {
            return Err(PpuError::InvalidRegisterState(format!(
                "CR{} cannot hold {:#06b}",
                field,
                value.bits()
            )));
        }

        if value == CrFlags::SO {
            self.set_so(field);
        } else {
            self.fields[field] = value | (self.fields[field] & CrFlags::SO);
        }
        Ok(())
    }

    /// Replace a field wholesale, SO included
    #[inline]
    pub(crate) fn replace_field(&mut self, field: usize, value: CrFlags) {
        self.fields[field] = value;
    }

    /// Zero a field, SO included
    #[inline]
    pub fn clear(&mut self, field: usize) {
        self.fields[field] = CrFlags::empty();
    }

    /// Replace each field whose mask bit is set (bit 7 selects field 0)
    pub fn load_from_value(&mut self, value: u32, field_mask: u8) {
        for field in 0..8 {
            if field_mask & (0x80 >> field) != 0 {
                let nibble = (value >> (28 - 4 * field)) & 0xF;
                self.fields[field] = CrFlags::from_bits_truncate(nibble as u8);
            }
        }
    }

    /// Pack all fields into a 32-bit value
    pub fn to_value(&self) -> u32 {
        self.fields
            .iter()
            .enumerate()
            .fold(0, |acc, (field, flags)| {
                acc | ((flags.bits() as u32) << (28 - 4 * field))
            })
    }

    #[inline]
    pub fn is_lesser(&self, field: usize) -> bool {
        self.fields[field].contains(CrFlags::LT)
    }

    #[inline]
    pub fn is_bigger(&self, field: usize) -> bool {
        self.fields[field].contains(CrFlags::GT)
    }

    #[inline]
    pub fn is_equal(&self, field: usize) -> bool {
        self.fields[field].contains(CrFlags::EQ)
    }

    #[inline]
    pub fn is_summary_overflow(&self, field: usize) -> bool {
        self.fields[field].contains(CrFlags::SO)
    }

    /// Read CR bit `bit` (0-31, MSB-first)
    #[inline]
    pub fn bit(&self, bit: u8) -> bool {
        self.to_value() & (0x8000_0000 >> bit) != 0
    }

    /// Write CR bit `bit` (0-31, MSB-first)
    pub fn set_bit(&mut self, bit: u8, value: bool) {
        let field = (bit / 4) as usize;
        let flag = CrFlags::from_bits_truncate(0b1000 >> (bit % 4));
        self.fields[field].set(flag, value);
    }
}

impl fmt::Display for ConditionRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, flags) in self.fields.iter().enumerate() {
            if field > 0 {
                write!(f, ", ")?;
            }
            write!(f, "CR{}:", field)?;
            if flags.is_empty() {
                write!(f, " -")?;
            }
            for (name, _) in flags.iter_names() {
                write!(f, " {}", name)?;
            }
        }
        Ok(())
    }
}

/// Fixed-point exception register
///
/// Packed layout (bit 31 = PowerPC bit 0): SO, OV, CA, 22 reserved bits,
/// 7-bit byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Xer {
    so: bool,
    ov: bool,
    ca: bool,
    reserved: u32,
    byte_count: u8,
}

impl Xer {
    const RESERVED_MASK: u32 = 0x3F_FFFF;

    pub fn from_value(value: u32) -> Self {
        Self {
            so: value & (1 << 31) != 0,
            ov: value & (1 << 30) != 0,
            ca: value & (1 << 29) != 0,
            reserved: (value >> 7) & Self::RESERVED_MASK,
            byte_count: (value & 0x7F) as u8,
        }
    }

    pub fn to_value(&self) -> u32 {
        (self.so as u32) << 31
            | (self.ov as u32) << 30
            | (self.ca as u32) << 29
            | self.reserved << 7
            | self.byte_count as u32
    }

    #[inline]
    pub fn so(&self) -> bool {
        self.so
    }

    #[inline]
    pub fn ov(&self) -> bool {
        self.ov
    }

    #[inline]
    pub fn ca(&self) -> bool {
        self.ca
    }

    #[inline]
    pub fn byte_count(&self) -> u8 {
        self.byte_count
    }

    #[inline]
    pub fn set_ca(&mut self, ca: bool) {
        self.ca = ca;
    }
}

/// PPU register set
#[derive(Debug, Clone, PartialEq)]
pub struct PpuRegisters {
    /// General Purpose Registers
    pub gpr: [u32; 32],
    /// Floating Point Registers (not touched by the interpreter)
    pub fpr: [f64; 32],
    /// Condition Register
    pub cr: ConditionRegister,
    /// Fixed-Point Exception Register
    pub xer: Xer,
    /// Link Register
    pub lr: u32,
    /// Count Register
    pub ctr: u32,
    /// Program Counter
    pub pc: u32,
}

impl Default for PpuRegisters {
    fn default() -> Self {
        Self {
            gpr: [0; 32],
            fpr: [0.0; 32],
            cr: ConditionRegister::default(),
            xer: Xer::default(),
            lr: 0,
            ctr: 0,
            pc: 0,
        }
    }
}

impl PpuRegisters {
    /// Read a GPR
    #[inline]
    pub fn gpr(&self, index: u8) -> u32 {
        self.gpr[index as usize]
    }

    /// Write a GPR
    #[inline]
    pub fn set_gpr(&mut self, index: u8, value: u32) {
        self.gpr[index as usize] = value;
    }

    /// Read a base register, where r0 means literal zero
    #[inline]
    pub fn gpr_or_zero(&self, index: u8) -> u32 {
        if index == 0 {
            0
        } else {
            self.gpr(index)
        }
    }

    /// Record a result into CR0 as a signed compare against zero
    #[inline]
    pub fn record_cr0(&mut self, value: u32) {
        self.cr.compare(0, value as i32, 0);
    }
}
