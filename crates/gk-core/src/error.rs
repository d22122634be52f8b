//! Error types for the oxidized-gekko interpreter

use thiserror::Error;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("PPU error: {0}")]
    Ppu(#[from] PpuError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Memory-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Out of bounds access at 0x{addr:08x} (length {len})")]
    OutOfBounds { addr: u32, len: usize },

    #[error("Alignment error: address 0x{addr:08x} not aligned to {align}")]
    Alignment { addr: u32, align: u32 },

    #[error("Section at 0x{first:08x} overlaps section at 0x{second:08x}")]
    Overlap { first: u32, second: u32 },

    #[error("Invalid section: base 0x{base:08x}, size 0x{size:x}")]
    InvalidSection { base: u32, size: u32 },
}

/// PPU (PowerPC Processing Unit) errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PpuError {
    /// A decoded operand violates a structural precondition of its form
    #[error("Invalid instruction form 0x{word:08x}: {reason}")]
    InvalidInstructionForm { word: u32, reason: &'static str },

    #[error("Unsupported opcode in 0x{word:08x}: primary {primary}, secondary {secondary:?}")]
    UnsupportedOpcode {
        word: u32,
        primary: u8,
        secondary: Option<u16>,
    },

    #[error("Unsupported feature in {mnemonic}: {feature}")]
    UnsupportedFeature {
        mnemonic: &'static str,
        feature: &'static str,
    },

    #[error("Unsupported SPR {0}")]
    UnsupportedSpr(u16),

    #[error("Memory fault: {0}")]
    MemoryFault(#[from] MemoryError),

    #[error("Invalid register state: {0}")]
    InvalidRegisterState(String),
}

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoryError::OutOfBounds {
            addr: 0x8180_0000,
            len: 4,
        };
        assert_eq!(
            format!("{}", err),
            "Out of bounds access at 0x81800000 (length 4)"
        );

        let err = PpuError::UnsupportedOpcode {
            word: 0x0000_0000,
            primary: 0,
            secondary: None,
        };
        assert_eq!(
            format!("{}", err),
            "Unsupported opcode in 0x00000000: primary 0, secondary None"
        );
    }

    #[test]
    fn test_error_conversion() {
        let mem_err = MemoryError::Alignment { addr: 2, align: 4 };
        let ppu_err: PpuError = mem_err.clone().into();
        assert_eq!(ppu_err, PpuError::MemoryFault(mem_err));

        let emu_err: EmulatorError = ppu_err.into();
        assert!(matches!(emu_err, EmulatorError::Ppu(_)));
    }
}
