//! Memory map constants

/// GameCube main RAM, cached view
pub const GAMECUBE_CACHED_BASE: u32 = 0x8000_0000;

/// GameCube main RAM, uncached view
pub const GAMECUBE_UNCACHED_BASE: u32 = 0xC000_0000;

/// GameCube main RAM size (24 MiB)
pub const GAMECUBE_RAM_SIZE: u32 = 0x0180_0000;

/// One past the last byte of the 32-bit address space
pub const ADDRESS_SPACE_END: u64 = 1 << 32;
