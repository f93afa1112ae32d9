//! Heap-backed block device.
//!
//! One contiguous `Vec<u8>` sliced into fixed blocks. This is the device the
//! test harness runs on: geometry is fully caller-chosen, so a 64-byte block
//! with a handful of slots per node is as valid as a 16 KiB one.

use std::cell::Cell;

use eyre::{ensure, Result};

use super::{BlockCache, CacheStats};

#[derive(Debug)]
pub struct MemoryBlockCache {
    block_size: usize,
    num_blocks: u32,
    data: Vec<u8>,
    reads: Cell<u64>,
    writes: u64,
    allocations: u64,
    deallocations: u64,
}

impl MemoryBlockCache {
    /// Creates a zero-filled device of `num_blocks` blocks of `block_size`
    /// bytes each.
    pub fn new(block_size: usize, num_blocks: u32) -> Self {
        Self {
            block_size,
            num_blocks,
            data: vec![0u8; block_size * num_blocks as usize],
            reads: Cell::new(0),
            writes: 0,
            allocations: 0,
            deallocations: 0,
        }
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

impl BlockCache for MemoryBlockCache {
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
        Ok(&self.data[offset..offset + self.block_size])
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
        self.data[offset..offset + self.block_size].copy_from_slice(data);
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
