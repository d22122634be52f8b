//! Memory inspection helpers

use crate::manager::MemorySystem;
use std::path::{Path, PathBuf};

impl MemorySystem {
    /// Write every section's contents to `<dir>/<cached_base>.bin`.
    ///
    /// File names use the cached base as 8 lowercase hex digits. Returns the
    /// paths written, in section order.
    pub fn dump(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.sections().len());
        for section in self.sections() {
            let path = dir.join(format!("{:08x}.bin", section.cached_base()));
            std::fs::write(&path, section.as_slice())?;
            tracing::debug!("Dumped 0x{:x} bytes to {}", section.size(), path.display());
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::{MemoryRegion, MemorySystem};

    #[test]
    fn test_dump_sections() {
        let mut mem = MemorySystem::new(&[
            MemoryRegion {
                cached_base: 0x8000_0000,
                uncached_base: 0xC000_0000,
                size: 0x20,
            },
            MemoryRegion {
                cached_base: 0x9000_0000,
                uncached_base: 0xD000_0000,
                size: 0x10,
            },
        ])
        .unwrap();
        mem.write_be32(0xC000_0004, 0xCAFEBABE).unwrap();

        let dir = std::env::temp_dir().join(format!("gk-dump-{}", std::process::id()));
        let paths = mem.dump(&dir).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].file_name().unwrap(), "80000000.bin");
        assert_eq!(paths[1].file_name().unwrap(), "90000000.bin");

        let contents = std::fs::read(&paths[0]).unwrap();
        assert_eq!(contents.len(), 0x20);
        assert_eq!(&contents[4..8], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), vec![0u8; 0x10]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
