//! Memory system implementation

use crate::constants::*;
use gk_core::config::SectionConfig;
use gk_core::error::MemoryError;

/// Memory region descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Base address of the cached view
    pub cached_base: u32,
    /// Base address of the uncached view
    pub uncached_base: u32,
    /// Size in bytes
    pub size: u32,
}

impl From<SectionConfig> for MemoryRegion {
    fn from(section: SectionConfig) -> Self {
        Self {
            cached_base: section.cached_base,
            uncached_base: section.uncached_base,
            size: section.size,
        }
    }
}

/// A mapped section backed by a single buffer.
///
/// Both the cached and the uncached address ranges resolve to the same bytes.
#[derive(Debug, Clone)]
pub struct MemorySection {
    region: MemoryRegion,
    data: Box<[u8]>,
}

impl MemorySection {
    fn new(region: MemoryRegion) -> Self {
        Self {
            region,
            data: vec![0u8; region.size as usize].into_boxed_slice(),
        }
    }

    /// Base address of the cached view
    pub fn cached_base(&self) -> u32 {
        self.region.cached_base
    }

    /// Base address of the uncached view
    pub fn uncached_base(&self) -> u32 {
        self.region.uncached_base
    }

    /// Size in bytes
    pub fn size(&self) -> u32 {
        self.region.size
    }

    /// Section descriptor
    pub fn region(&self) -> MemoryRegion {
        self.region
    }

    /// Raw contents
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Offset of `addr` in the backing buffer, through either alias
    #[inline]
    fn offset_of(&self, addr: u32) -> Option<usize> {
        let size = self.region.size as u64;
        [self.region.cached_base, self.region.uncached_base]
            .into_iter()
            .find(|&base| (addr as u64) >= base as u64 && (addr as u64) < base as u64 + size)
            .map(|base| (addr - base) as usize)
    }
}

/// Section-based memory for a single emulated CPU
///
/// Holds a fixed list of non-overlapping sections created at construction.
/// Multi-byte values are stored big-endian.
#[derive(Debug, Clone)]
pub struct MemorySystem {
    sections: Vec<MemorySection>,
}

impl MemorySystem {
    /// Create a memory system from a list of section descriptors
    pub fn new(regions: &[MemoryRegion]) -> Result<Self, MemoryError> {
        for region in regions {
            Self::validate_region(region)?;
        }

        let ranges: Vec<(u64, u64)> = regions
            .iter()
            .flat_map(|r| {
                let size = r.size as u64;
                [
                    (r.cached_base as u64, r.cached_base as u64 + size),
                    (r.uncached_base as u64, r.uncached_base as u64 + size),
                ]
            })
            .collect();

        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                if a.0 < b.1 && b.0 < a.1 {
                    return Err(MemoryError::Overlap {
                        first: a.0 as u32,
                        second: b.0 as u32,
                    });
                }
            }
        }

        let sections = regions
            .iter()
            .map(|&region| {
                tracing::debug!(
                    "Mapping section: cached 0x{:08x}, uncached 0x{:08x}, size 0x{:x}",
                    region.cached_base,
                    region.uncached_base,
                    region.size
                );
                MemorySection::new(region)
            })
            .collect();

        Ok(Self { sections })
    }

    /// GameCube main RAM: one 24 MiB section at its cached and uncached bases
    pub fn gamecube() -> Self {
        Self {
            sections: vec![MemorySection::new(MemoryRegion {
                cached_base: GAMECUBE_CACHED_BASE,
                uncached_base: GAMECUBE_UNCACHED_BASE,
                size: GAMECUBE_RAM_SIZE,
            })],
        }
    }

    fn validate_region(region: &MemoryRegion) -> Result<(), MemoryError> {
        let size = region.size as u64;
        let fits = |base: u32| base as u64 + size <= ADDRESS_SPACE_END;

        if size == 0 || !fits(region.cached_base) || !fits(region.uncached_base) {
            return Err(MemoryError::InvalidSection {
                base: region.cached_base,
                size: region.size,
            });
        }

        Ok(())
    }

    /// Mapped sections, in construction order
    pub fn sections(&self) -> &[MemorySection] {
        &self.sections
    }

    /// Locate `len` bytes at `addr`, returning the section index and buffer offset
    fn locate(&self, addr: u32, len: usize) -> Result<(usize, usize), MemoryError> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(index, section)| {
                section.offset_of(addr).map(|offset| (index, offset, section.data.len()))
            })
            .filter(|&(_, offset, size)| offset.checked_add(len).is_some_and(|end| end <= size))
            .map(|(index, offset, _)| (index, offset))
            .ok_or(MemoryError::OutOfBounds { addr, len })
    }

    /// Read `len` bytes starting at `addr`
    pub fn read(&self, addr: u32, len: usize) -> Result<&[u8], MemoryError> {
        let (index, offset) = self.locate(addr, len)?;
        Ok(&self.sections[index].data[offset..offset + len])
    }

    /// Write `bytes` starting at `addr`
    pub fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let (index, offset) = self.locate(addr, bytes.len())?;
        self.sections[index].data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Read a byte
    #[inline]
    pub fn read_u8(&self, addr: u32) -> Result<u8, MemoryError> {
        Ok(self.read(addr, 1)?[0])
    }

    /// Read a big-endian halfword
    #[inline]
    pub fn read_be16(&self, addr: u32) -> Result<u16, MemoryError> {
        let bytes = self.read(addr, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian word
    #[inline]
    pub fn read_be32(&self, addr: u32) -> Result<u32, MemoryError> {
        let bytes = self.read(addr, 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Write a byte
    #[inline]
    pub fn write_u8(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        self.write(addr, &[value])
    }

    /// Write a big-endian halfword
    #[inline]
    pub fn write_be16(&mut self, addr: u32, value: u16) -> Result<(), MemoryError> {
        self.write(addr, &value.to_be_bytes())
    }

    /// Write a big-endian word
    #[inline]
    pub fn write_be32(&mut self, addr: u32, value: u32) -> Result<(), MemoryError> {
        self.write(addr, &value.to_be_bytes())
    }

    /// Copy an image segment into memory.
    ///
    /// This is the only entry point executable loaders need.
    pub fn load_image(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        tracing::debug!("Loading {} bytes at 0x{:08x}", bytes.len(), addr);
        self.write(addr, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_memory() -> MemorySystem {
        MemorySystem::new(&[
            MemoryRegion {
                cached_base: 0x8000_0000,
                uncached_base: 0xC000_0000,
                size: 0x1000,
            },
            MemoryRegion {
                cached_base: 0x9000_0000,
                uncached_base: 0xD000_0000,
                size: 0x100,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_read_write_word() {
        let mut mem = small_memory();
        mem.write_be32(0x8000_0010, 0xDEADBEEF).unwrap();
        assert_eq!(mem.read_be32(0x8000_0010).unwrap(), 0xDEADBEEF);
        assert_eq!(mem.read(0x8000_0010, 4).unwrap(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(mem.read_be16(0x8000_0012).unwrap(), 0xBEEF);
        assert_eq!(mem.read_u8(0x8000_0011).unwrap(), 0xAD);
    }

    #[test]
    fn test_aliases_share_storage() {
        let mut mem = small_memory();
        mem.write_be32(0x8000_0100, 0x12345678).unwrap();
        assert_eq!(mem.read_be32(0xC000_0100).unwrap(), 0x12345678);

        mem.write_u8(0xD000_0000, 0xAA).unwrap();
        assert_eq!(mem.read_u8(0x9000_0000).unwrap(), 0xAA);
    }

    #[test]
    fn test_huge_length_is_out_of_bounds() {
        let mut mem = small_memory();
        assert_eq!(
            mem.read(0x8000_0010, usize::MAX),
            Err(MemoryError::OutOfBounds {
                addr: 0x8000_0010,
                len: usize::MAX
            })
        );
        assert!(mem.read(0xC000_0FFF, usize::MAX - 0xFFE).is_err());
        assert!(mem.write(0x8000_0010, &[]).is_ok());
    }

    #[test]
    fn test_access_ending_at_section_end() {
        let mut mem = small_memory();
        assert!(mem.write_be32(0x8000_0FFC, 1).is_ok());
        assert!(mem.read(0x8000_0000, 0x1000).is_ok());
        assert_eq!(
            mem.write_be32(0x8000_0FFD, 1),
            Err(MemoryError::OutOfBounds {
                addr: 0x8000_0FFD,
                len: 4
            })
        );
        assert!(mem.read_u8(0x8000_1000).is_err());
    }

    #[test]
    fn test_unmapped_address() {
        let mem = small_memory();
        assert!(matches!(
            mem.read_be32(0x0000_0000),
            Err(MemoryError::OutOfBounds { addr: 0, len: 4 })
        ));
    }

    #[test]
    fn test_overlapping_sections_rejected() {
        let result = MemorySystem::new(&[
            MemoryRegion {
                cached_base: 0x8000_0000,
                uncached_base: 0xC000_0000,
                size: 0x1000,
            },
            MemoryRegion {
                cached_base: 0x8000_0800,
                uncached_base: 0xD000_0000,
                size: 0x1000,
            },
        ]);
        assert!(matches!(result, Err(MemoryError::Overlap { .. })));

        // Cached alias overlapping its own uncached alias
        let result = MemorySystem::new(&[MemoryRegion {
            cached_base: 0x8000_0000,
            uncached_base: 0x8000_0800,
            size: 0x1000,
        }]);
        assert!(matches!(result, Err(MemoryError::Overlap { .. })));
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let zero = MemoryRegion {
            cached_base: 0x8000_0000,
            uncached_base: 0xC000_0000,
            size: 0,
        };
        assert!(matches!(
            MemorySystem::new(&[zero]),
            Err(MemoryError::InvalidSection { .. })
        ));

        let wraps = MemoryRegion {
            cached_base: 0x8000_0000,
            uncached_base: 0xFFFF_F000,
            size: 0x2000,
        };
        assert!(matches!(
            MemorySystem::new(&[wraps]),
            Err(MemoryError::InvalidSection { .. })
        ));
    }

    #[test]
    fn test_gamecube_preset() {
        let mut mem = MemorySystem::gamecube();
        assert_eq!(mem.sections().len(), 1);
        assert_eq!(mem.sections()[0].size(), 0x0180_0000);
        mem.write_be32(0x817F_FFFC, 7).unwrap();
        assert_eq!(mem.read_be32(0xC17F_FFFC).unwrap(), 7);
        assert!(mem.read_u8(0x8180_0000).is_err());
    }

    #[test]
    fn test_load_image() {
        let mut mem = small_memory();
        mem.load_image(0x9000_0010, &[1, 2, 3]).unwrap();
        assert_eq!(mem.read(0xD000_0010, 3).unwrap(), &[1, 2, 3]);
        assert!(mem.load_image(0x9000_00FF, &[1, 2]).is_err());
    }
}
