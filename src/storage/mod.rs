//! # Storage Module
//!
//! The block device layer underneath the index. A device is a fixed array of
//! fixed-size blocks addressed by an unsigned block number; the index core
//! never talks to the operating system directly, only to the [`BlockCache`]
//! trait defined here.
//!
//! ## Contract
//!
//! ```text
//! block_size()          size in bytes of every block
//! num_blocks()          total number of blocks; the device never grows
//! read(n)               whole-block read; read-after-write consistent
//! write(n, data)        whole-block write; data.len() must equal block_size()
//! notify_allocate(n)    advisory, fired when the index takes a block off the
//! notify_deallocate(n)  free list / puts one back; used for statistics only
//! ```
//!
//! The contract promises read-after-write consistency per block and nothing
//! about crash durability; whatever the device flushes is what survives.
//!
//! ## Implementations
//!
//! - [`MemoryBlockCache`]: heap-backed, the default test harness device.
//! - [`MmapBlockCache`]: a memory-mapped file, for persistent trees.
//!
//! Both bounds-check block numbers, reject short or long writes, and count
//! traffic into [`CacheStats`].
//!
//! ## Thread Safety
//!
//! The index runs single-threaded by contract, so the device layer assumes a
//! single caller. Wrap the whole index in a lock for concurrent use.

mod memory;
mod mmap;

pub use memory::MemoryBlockCache;
pub use mmap::MmapBlockCache;

use eyre::Result;

/// Device contract consumed by the index core.
///
/// `read` is the "unserialize" half of the node codec's I/O and `write` the
/// "serialize" half; both move whole blocks.
pub trait BlockCache {
    fn block_size(&self) -> usize;

    fn num_blocks(&self) -> u32;

    fn read(&self, block: u32) -> Result<&[u8]>;

    fn write(&mut self, block: u32, data: &[u8]) -> Result<()>;

    /// Advisory: the index took `block` off the free list.
    fn notify_allocate(&mut self, _block: u32) {}

    /// Advisory: the index returned `block` to the free list.
    fn notify_deallocate(&mut self, _block: u32) {}
}

/// Traffic counters maintained by the provided devices.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub reads: u64,
    pub writes: u64,
    pub allocations: u64,
    pub deallocations: u64,
}
