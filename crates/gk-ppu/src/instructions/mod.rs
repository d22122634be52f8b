//! PPU instruction families

pub mod branch;
pub mod compare;
pub mod integer;
pub mod load_store;
pub mod system;
