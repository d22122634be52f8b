//! PPU (PowerPC) emulation for oxidized-gekko
//!
//! This crate implements the 32-bit integer core of the GameCube "Gekko"
//! PowerPC CPU as a plain interpreter.
//!
//! ## Usage
//!
//! ```
//! use gk_memory::MemorySystem;
//! use gk_ppu::Machine;
//!
//! let mut machine = Machine::new(MemorySystem::gamecube());
//!
//! // li r3, 10; addi r3, r3, 5; blr
//! let code = [0x3860_000Au32, 0x3863_0005, 0x4E80_0020];
//! let bytes: Vec<u8> = code.iter().flat_map(|w| w.to_be_bytes()).collect();
//! machine.memory_mut().load_image(0x8000_3100, &bytes).unwrap();
//!
//! machine.run_function(0x8000_3100).unwrap();
//! assert_eq!(machine.regs.gpr(3), 15);
//! ```

pub mod decoder;
pub mod instruction;
pub mod instructions;
pub mod interpreter;
pub mod machine;
pub mod registers;

pub use decoder::PpuDecoder;
pub use instruction::Instruction;
pub use interpreter::PpuInterpreter;
pub use machine::Machine;
pub use registers::{ConditionRegister, CrFlags, PpuRegisters, Xer};
