//! Memory system for oxidized-gekko
//!
//! Fixed, non-overlapping sections, each reachable through a cached and an
//! uncached alias that share one backing buffer. All multi-byte accesses are
//! big-endian.

pub mod constants;
pub mod debug;
pub mod manager;

pub use constants::*;
pub use manager::{MemoryRegion, MemorySection, MemorySystem};
