//! # B+ Tree Index Implementation
//!
//! A disk-backed B+ tree mapping fixed-width keys to fixed-width values. All
//! state lives in fixed-size blocks behind the [`BlockCache`] contract; block
//! numbers are the only handles, so the tree survives detach/re-attach and
//! process restarts on a persistent device.
//!
//! ## Node Types
//!
//! - **Superblock**: block 0, the tree's metadata (key/value/block widths,
//!   root index, free-list head).
//! - **Root / Interior**: separator keys interleaved with child pointers in
//!   the pattern `P0 K0 P1 K1 ... K(n-1) Pn`. A separator routes equal keys
//!   right: the subtree under `Pi` holds keys in `[K(i-1), Ki)`.
//! - **Leaf**: `(key, value)` pairs in ascending key order. All keys in the
//!   tree are unique; reinserting one fails with [`TreeError::Conflict`].
//! - **Unallocated**: a free-list member, header only.
//!
//! ## Split Propagation
//!
//! Inserts descend with a breadcrumb stack of ancestor block indices instead
//! of parent pointers. A node that reaches capacity splits into two halves
//! joined by a separator inserted one breadcrumb up; at the root the split
//! mints a fresh root and rewrites the superblock.
//!
//! ## What This Module Does Not Do
//!
//! Deletion is reserved ([`TreeError::Unimplemented`]), there is no
//! write-ahead log (durability is whatever the device provides), and a single
//! writer is assumed throughout.
//!
//! [`BlockCache`]: crate::storage::BlockCache

mod display;
mod error;
mod node;
mod tree;

pub use display::DisplayMode;
pub use error::{TreeError, TreeResult};
pub use node::{Node, NodeType, NODE_HEADER_SIZE, PTR_SIZE};
pub use tree::{BTreeIndex, SUPERBLOCK_INDEX};
