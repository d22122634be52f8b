//! PPU machine state and run loop
//!
//! A [`Machine`] owns one register context and one memory system. Several
//! CPUs are modelled as several machines.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::decoder::PpuDecoder;
use crate::instruction::Instruction;
use crate::interpreter::PpuInterpreter;
use crate::registers::PpuRegisters;
use gk_core::config::{Config, DebugConfig};
use gk_core::error::{MemoryError, PpuError};
use gk_memory::{MemoryRegion, MemorySystem};

/// Default LR value planted by [`Machine::run_function`]
pub const DEFAULT_RETURN_SENTINEL: u32 = 0xDEAD_BEE0;

/// Single PowerPC CPU with its memory
pub struct Machine {
    /// Register context
    pub regs: PpuRegisters,
    pub(crate) memory: MemorySystem,
    return_sentinel: u32,
    trace_instructions: bool,
    dump_dir: PathBuf,
    instruction_count: u64,
    stop: Arc<AtomicBool>,
}

impl Machine {
    /// Create a machine with zeroed registers over the given memory
    pub fn new(memory: MemorySystem) -> Self {
        Self {
            regs: PpuRegisters::default(),
            memory,
            return_sentinel: DEFAULT_RETURN_SENTINEL,
            trace_instructions: false,
            dump_dir: DebugConfig::default().dump_dir,
            instruction_count: 0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a machine from configuration
    pub fn from_config(config: &Config) -> gk_core::Result<Self> {
        config.validate()?;

        let regions: Vec<MemoryRegion> = config
            .memory
            .sections
            .iter()
            .copied()
            .map(MemoryRegion::from)
            .collect();

        let mut machine = Self::new(MemorySystem::new(&regions)?);
        machine.return_sentinel = config.cpu.return_sentinel;
        machine.trace_instructions = config.cpu.trace_instructions;
        machine.dump_dir = config.debug.dump_dir.clone();
        Ok(machine)
    }

    pub fn memory(&self) -> &MemorySystem {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemorySystem {
        &mut self.memory
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.regs.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.regs.pc = pc;
    }

    pub fn return_sentinel(&self) -> u32 {
        self.return_sentinel
    }

    pub fn set_return_sentinel(&mut self, sentinel: u32) {
        self.return_sentinel = sentinel;
    }

    /// Enable per-instruction trace logging
    pub fn set_trace_instructions(&mut self, enabled: bool) {
        self.trace_instructions = enabled;
    }

    pub fn dump_dir(&self) -> &Path {
        &self.dump_dir
    }

    pub fn set_dump_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dump_dir = dir.into();
    }

    /// Write every memory section to the dump directory
    pub fn dump(&self) -> gk_core::Result<Vec<PathBuf>> {
        Ok(self.memory.dump(&self.dump_dir)?)
    }

    /// Shared flag that stops [`run`](Self::run) and
    /// [`run_function`](Self::run_function) between instructions
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Get the number of instructions executed
    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Reset the instruction count
    pub fn reset_instruction_count(&mut self) {
        self.instruction_count = 0;
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// PC is advanced before execution. On error PC is left on the faulting
    /// instruction and the instruction counter is not incremented.
    pub fn step(&mut self) -> Result<Instruction, PpuError> {
        let pc = self.regs.pc;
        if pc % 4 != 0 {
            return Err(MemoryError::Alignment { addr: pc, align: 4 }.into());
        }

        let word = self.memory.read_be32(pc)?;
        let instruction = PpuDecoder::decode(word).map_err(|e| {
            tracing::warn!("Cannot decode 0x{:08x} at 0x{:08x}: {}", word, pc, e);
            e
        })?;

        if self.trace_instructions {
            tracing::trace!(
                "0x{:08x}: {:08x}  {}",
                pc,
                word,
                instruction.disassemble(pc)
            );
        }

        self.regs.pc = pc.wrapping_add(4);
        if let Err(e) = PpuInterpreter::execute(&instruction, self) {
            self.regs.pc = pc;
            return Err(e);
        }
        self.instruction_count += 1;

        Ok(instruction)
    }

    /// Run until the stop flag is raised. The flag is cleared on return.
    pub fn run(&mut self) -> Result<(), PpuError> {
        while !self.stop.load(Ordering::Relaxed) {
            self.step()?;
        }
        self.stop.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Call the function at `address` and run until it returns to the sentinel
    pub fn run_function(&mut self, address: u32) -> Result<(), PpuError> {
        tracing::debug!("Entering function at 0x{:08x}", address);

        self.regs.pc = address;
        self.regs.lr = self.return_sentinel;
        let start = self.instruction_count;

        while self.regs.pc != self.return_sentinel {
            if self.stop.swap(false, Ordering::Relaxed) {
                tracing::debug!("Function at 0x{:08x} stopped at 0x{:08x}", address, self.regs.pc);
                return Ok(());
            }
            self.step()?;
        }

        tracing::debug!(
            "Function at 0x{:08x} returned after {} instructions",
            address,
            self.instruction_count - start
        );
        Ok(())
    }

    /// Execute at most `count` instructions, returning how many ran
    pub fn run_for(&mut self, count: u64) -> Result<u64, PpuError> {
        for executed in 0..count {
            if self.stop.swap(false, Ordering::Relaxed) {
                return Ok(executed);
            }
            self.step()?;
        }
        Ok(count)
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &format_args!("0x{:08x}", self.regs.pc))
            .field("lr", &format_args!("0x{:08x}", self.regs.lr))
            .field("ctr", &format_args!("0x{:08x}", self.regs.ctr))
            .field("cr", &format_args!("{}", self.regs.cr))
            .field("sections", &self.memory.sections().len())
            .field("instruction_count", &self.instruction_count)
            .finish()
    }
}
