//! # blocktree — Disk-Backed B+ Tree Index
//!
//! A persistent, block-structured associative map from fixed-width keys to
//! fixed-width values. Point lookups, ordered inserts with splits propagating
//! to the root, in-place updates, and a structural self-check, all over a
//! pluggable fixed-size block device.
//!
//! ## Quick Start
//!
//! ```ignore
//! use blocktree::{BTreeIndex, DisplayMode, MemoryBlockCache};
//!
//! let cache = MemoryBlockCache::new(4096, 256);
//! let mut index = BTreeIndex::attach(cache, 16, 64, 0, true)?;
//!
//! index.insert(b"0000000000000001", &[0u8; 64])?;
//! let value = index.lookup(b"0000000000000001")?;
//! index.sanity_check()?;
//! index.detach()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        BTreeIndex (public API)      │
//! ├─────────────────────────────────────┤
//! │  navigator │ splits │ free list     │
//! ├─────────────────────────────────────┤
//! │       Node codec (one block)        │
//! ├─────────────────────────────────────┤
//! │   BlockCache (memory / mmap file)   │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: the block device contract and the in-memory and
//!   memory-mapped implementations
//! - [`btree`]: node codec, tree operations, free-list allocator, display

pub mod btree;
pub mod storage;

pub use btree::{BTreeIndex, DisplayMode, Node, NodeType, TreeError, TreeResult};
pub use storage::{BlockCache, CacheStats, MemoryBlockCache, MmapBlockCache};
