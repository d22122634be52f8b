//! Core types for the oxidized-gekko PowerPC interpreter
//!
//! This crate provides the foundational error types, configuration,
//! and logging infrastructure shared by the memory and PPU crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{EmulatorError, MemoryError, PpuError, Result};
