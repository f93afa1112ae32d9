//! # Memory-Mapped Block Device
//!
//! A fixed-size device over a memory-mapped file. The file is exactly
//! `num_blocks * block_size` bytes of concatenated blocks, nothing else: no
//! file header, no checksum, no version. All tree metadata lives inside block
//! 0 (the superblock), so compatibility is decided by the sizes recorded
//! there.
//!
//! ```text
//! Offset 0:               Block 0 (superblock)
//! Offset block_size:      Block 1
//! Offset 2 * block_size:  Block 2
//! ...
//! ```
//!
//! The device never grows. The index's allocator hands out blocks from the
//! free list formatted at creation time and reports exhaustion to the caller;
//! resizing a tree means copying it into a larger device.
//!
//! ## Durability
//!
//! Writes land in the mapping and reach disk whenever the OS flushes or when
//! [`MmapBlockCache::sync`] is called. The contract makes no crash-consistency
//! promise beyond that.

use std::cell::Cell;
use std::fs::OpenOptions;
use std::path::Path;

use eyre::{ensure, Result, WrapErr};
use memmap2::MmapMut;

use super::{BlockCache, CacheStats};

#[derive(Debug)]
pub struct MmapBlockCache {
    mmap: MmapMut,
    block_size: usize,
    num_blocks: u32,
    reads: Cell<u64>,
    writes: u64,
    allocations: u64,
    deallocations: u64,
}

impl MmapBlockCache {
    /// Creates (or truncates) a device file sized for `num_blocks` blocks.
    pub fn create<P: AsRef<Path>>(path: P, block_size: usize, num_blocks: u32) -> Result<Self> {
        let path = path.as_ref();

        ensure!(block_size > 0, "block size must be at least 1 byte");
        ensure!(num_blocks > 0, "device must hold at least 1 block");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .wrap_err_with(|| format!("failed to create device file '{}'", path.display()))?;

        let file_size = num_blocks as u64 * block_size as u64;
        file.set_len(file_size)
            .wrap_err_with(|| format!("failed to set file size to {} bytes", file_size))?;

        // SAFETY: MmapMut::map_mut is unsafe because memory-mapped files can
        // be modified externally. This is safe because:
        // 1. We just created this file with exclusive access (truncate=true)
        // 2. The file size is a valid multiple of block_size
        // 3. The mapping's lifetime is tied to MmapBlockCache
        // 4. All access goes through read()/write() which bounds-check
        let mmap = unsafe {
            MmapMut::map_mut(&file)
                .wrap_err_with(|| format!("failed to memory-map '{}'", path.display()))?
        };

        Ok(Self {
            mmap,
            block_size,
            num_blocks,
            reads: Cell::new(0),
            writes: 0,
            allocations: 0,
            deallocations: 0,
        })
    }

    /// Opens an existing device file; its size must be a whole number of
    /// blocks.
    pub fn open<P: AsRef<Path>>(path: P, block_size: usize) -> Result<Self> {
        let path = path.as_ref();

        ensure!(block_size > 0, "block size must be at least 1 byte");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .wrap_err_with(|| format!("failed to open device file '{}'", path.display()))?;

        let file_size = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
            .len();

        ensure!(
            file_size > 0,
            "cannot open empty device file '{}'",
            path.display()
        );
        ensure!(
            file_size % block_size as u64 == 0,
            "device file '{}' size {} is not a multiple of block size {}",
            path.display(),
            file_size,
            block_size
        );

        let num_blocks = (file_size / block_size as u64) as u32;

        // SAFETY: same argument as in create(); additionally the size checks
        // above guarantee every block index maps inside the file.
        let mmap = unsafe {
            MmapMut::map_mut(&file)
                .wrap_err_with(|| format!("failed to memory-map '{}'", path.display()))?
        };

        Ok(Self {
            mmap,
            block_size,
            num_blocks,
            reads: Cell::new(0),
            writes: 0,
            allocations: 0,
            deallocations: 0,
        })
    }

    /// Flushes the mapping to disk.
    pub fn sync(&self) -> Result<()> {
        self.mmap.flush().wrap_err("failed to sync device to disk")
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            reads: self.reads.get(),
            writes: self.writes,
            allocations: self.allocations,
            deallocations: self.deallocations,
        }
    }
}

impl BlockCache for MmapBlockCache {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    fn read(&self, block: u32) -> Result<&[u8]> {
        ensure!(
            block < self.num_blocks,
            "block {} out of bounds (num_blocks={})",
            block,
            self.num_blocks
        );

        self.reads.set(self.reads.get() + 1);
        let offset = block as usize * self.block_size;
        Ok(&self.mmap[offset..offset + self.block_size])
    }

    fn write(&mut self, block: u32, data: &[u8]) -> Result<()> {
        ensure!(
            block < self.num_blocks,
            "block {} out of bounds (num_blocks={})",
            block,
            self.num_blocks
        );
        ensure!(
            data.len() == self.block_size,
            "write of {} bytes into {}-byte blocks",
            data.len(),
            self.block_size
        );

        let offset = block as usize * self.block_size;
        self.mmap[offset..offset + self.block_size].copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn notify_allocate(&mut self, _block: u32) {
        self.allocations += 1;
    }

    fn notify_deallocate(&mut self, _block: u32) {
        self.deallocations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_write_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("device.blk");
        let mut cache = MmapBlockCache::create(&path, 64, 4).unwrap();

        cache.write(2, &[0x5Au8; 64]).unwrap();

        assert_eq!(cache.read(2).unwrap(), &[0x5Au8; 64]);
        assert_eq!(cache.read(0).unwrap(), &[0u8; 64]);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("device.blk");

        {
            let mut cache = MmapBlockCache::create(&path, 32, 3).unwrap();
            cache.write(1, &[7u8; 32]).unwrap();
            cache.sync().unwrap();
        }

        let cache = MmapBlockCache::open(&path, 32).unwrap();
        assert_eq!(cache.num_blocks(), 3);
        assert_eq!(cache.read(1).unwrap(), &[7u8; 32]);
    }

    #[test]
    fn open_rejects_ragged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("device.blk");
        std::fs::write(&path, [0u8; 100]).unwrap();

        let result = MmapBlockCache::open(&path, 64);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a multiple of block size"));
    }

    #[test]
    fn read_out_of_bounds_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("device.blk");
        let cache = MmapBlockCache::create(&path, 32, 2).unwrap();

        assert!(cache.read(2).is_err());
    }
}
