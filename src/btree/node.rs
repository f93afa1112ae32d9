//! # Node Codec
//!
//! Every node occupies exactly one block and starts with the same 28-byte
//! header; the rest of the block is payload whose shape depends on the node
//! type.
//!
//! ## Header Layout (28 bytes, little-endian)
//!
//! ```text
//! Offset  Size  Field       Description
//! ------  ----  ----------  ----------------------------------------
//! 0       1     node_type   Unallocated / Superblock / Root / Interior / Leaf
//! 1       3     reserved    Zero
//! 4       4     key_size    Key width in bytes
//! 8       4     value_size  Value width in bytes
//! 12      4     block_size  Block size this tree was formatted with
//! 16      4     num_keys    Live key count
//! 20      4     root_block  Copy of the root index at creation time; only
//!                           the superblock's copy is authoritative
//! 24      4     free_next   Next free block (Unallocated and Superblock)
//! ```
//!
//! ## Payload Layouts
//!
//! ```text
//! Leaf:      K0 V0 | K1 V1 | ...                    num_keys entries
//! Interior:  P0 K0 | P1 K1 | ... K(n-1) | Pn        n keys, n+1 pointers
//! Unallocated / Superblock: header only
//! ```
//!
//! Keys are raw bytes compared lexicographically. Pointers are little-endian
//! `u32` block indices; index 0 is null (and the superblock's position).
//!
//! ## Capacity
//!
//! ```text
//! leaf_slots     = (block_size - 28) / (key_size + value_size)
//! interior_slots = (block_size - 28 - 4) / (key_size + 4)
//! ```
//!
//! A node is split when `num_keys` *reaches* capacity, so the transient
//! at-capacity state during a shift always fits inside the block.
//!
//! ## Addressing
//!
//! `Node` owns a block-sized buffer and moves whole blocks through the
//! [`BlockCache`]; block numbers are the only handles that cross call
//! boundaries, never in-memory node references. Slot accessors validate the
//! offset against `num_keys` (`num_keys + 1` for the last interior pointer)
//! and the physical block bounds before touching the payload.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::error::{TreeError, TreeResult};
use crate::storage::BlockCache;

pub const NODE_HEADER_SIZE: usize = 28;

/// Width of an on-disk block index.
pub const PTR_SIZE: usize = 4;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Unallocated = 0x00,
    Superblock = 0x01,
    Root = 0x02,
    Interior = 0x03,
    Leaf = 0x04,
    Unknown = 0xFF,
}

impl NodeType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => NodeType::Unallocated,
            0x01 => NodeType::Superblock,
            0x02 => NodeType::Root,
            0x03 => NodeType::Interior,
            0x04 => NodeType::Leaf,
            _ => NodeType::Unknown,
        }
    }

    /// Root and interior nodes share the pointer/separator payload layout.
    pub fn routes(self) -> bool {
        matches!(self, NodeType::Root | NodeType::Interior)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct NodeHeader {
    node_type: u8,
    reserved: [u8; 3],
    key_size: U32,
    value_size: U32,
    block_size: U32,
    num_keys: U32,
    root_block: U32,
    free_next: U32,
}

const _: () = assert!(std::mem::size_of::<NodeHeader>() == NODE_HEADER_SIZE);

/// One node's block buffer plus typed access to its header and slots.
#[derive(Debug, Clone)]
pub struct Node {
    buf: Vec<u8>,
}

impl Node {
    /// Builds a fresh zero-filled node of the given geometry.
    pub fn new(
        node_type: NodeType,
        key_size: u32,
        value_size: u32,
        block_size: u32,
        root_block: u32,
    ) -> Self {
        let mut buf = vec![0u8; block_size as usize];
        let header = NodeHeader {
            node_type: node_type as u8,
            reserved: [0; 3],
            key_size: U32::new(key_size),
            value_size: U32::new(value_size),
            block_size: U32::new(block_size),
            num_keys: U32::new(0),
            root_block: U32::new(root_block),
            free_next: U32::new(0),
        };
        buf[..NODE_HEADER_SIZE].copy_from_slice(header.as_bytes());
        Self { buf }
    }

    /// Reads the node stored at `block`.
    pub fn read_from<C: BlockCache>(cache: &C, block: u32) -> TreeResult<Self> {
        let data = cache.read(block)?;
        if data.len() < NODE_HEADER_SIZE {
            return Err(TreeError::Insane("block smaller than a node header"));
        }
        Ok(Self { buf: data.to_vec() })
    }

    /// Writes the node back to `block`.
    pub fn write_to<C: BlockCache>(&self, cache: &mut C, block: u32) -> TreeResult<()> {
        cache.write(block, &self.buf)?;
        Ok(())
    }

    fn header(&self) -> &NodeHeader {
        // Buffer length is validated at construction.
        NodeHeader::ref_from_bytes(&self.buf[..NODE_HEADER_SIZE]).unwrap()
    }

    fn header_mut(&mut self) -> &mut NodeHeader {
        NodeHeader::mut_from_bytes(&mut self.buf[..NODE_HEADER_SIZE]).unwrap()
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from_byte(self.header().node_type)
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.header_mut().node_type = node_type as u8;
    }

    pub fn key_size(&self) -> usize {
        self.header().key_size.get() as usize
    }

    pub fn value_size(&self) -> usize {
        self.header().value_size.get() as usize
    }

    pub fn block_size(&self) -> usize {
        self.header().block_size.get() as usize
    }

    pub fn num_keys(&self) -> usize {
        self.header().num_keys.get() as usize
    }

    pub fn set_num_keys(&mut self, num_keys: usize) {
        self.header_mut().num_keys = U32::new(num_keys as u32);
    }

    pub fn root_block(&self) -> u32 {
        self.header().root_block.get()
    }

    pub fn set_root_block(&mut self, block: u32) {
        self.header_mut().root_block = U32::new(block);
    }

    pub fn free_next(&self) -> u32 {
        self.header().free_next.get()
    }

    pub fn set_free_next(&mut self, block: u32) {
        self.header_mut().free_next = U32::new(block);
    }

    /// Key slots a leaf can persistently hold.
    pub fn leaf_slots(&self) -> usize {
        let entry = self.key_size() + self.value_size();
        if entry == 0 {
            return 0;
        }
        (self.block_size().saturating_sub(NODE_HEADER_SIZE)) / entry
    }

    /// Separator slots a root or interior node can persistently hold.
    pub fn interior_slots(&self) -> usize {
        let entry = self.key_size() + PTR_SIZE;
        (self
            .block_size()
            .saturating_sub(NODE_HEADER_SIZE + PTR_SIZE))
            / entry
    }

    fn check_key_index(&self, index: usize) -> TreeResult<()> {
        if index >= self.num_keys() {
            return Err(TreeError::OutOfBounds {
                index,
                numkeys: self.num_keys(),
            });
        }
        Ok(())
    }

    fn check_ptr_index(&self, index: usize) -> TreeResult<()> {
        if index > self.num_keys() {
            return Err(TreeError::OutOfBounds {
                index,
                numkeys: self.num_keys(),
            });
        }
        Ok(())
    }

    fn key_offset(&self, index: usize) -> TreeResult<usize> {
        match self.node_type() {
            NodeType::Leaf => {
                Ok(NODE_HEADER_SIZE + index * (self.key_size() + self.value_size()))
            }
            t if t.routes() => {
                Ok(NODE_HEADER_SIZE + index * (PTR_SIZE + self.key_size()) + PTR_SIZE)
            }
            other => Err(TreeError::BadNodeType(other)),
        }
    }

    fn payload(&self, offset: usize, len: usize) -> TreeResult<&[u8]> {
        if offset + len > self.buf.len() {
            return Err(TreeError::Insane("slot extends beyond block payload"));
        }
        Ok(&self.buf[offset..offset + len])
    }

    fn payload_mut(&mut self, offset: usize, len: usize) -> TreeResult<&mut [u8]> {
        if offset + len > self.buf.len() {
            return Err(TreeError::Insane("slot extends beyond block payload"));
        }
        Ok(&mut self.buf[offset..offset + len])
    }

    pub fn key_at(&self, index: usize) -> TreeResult<&[u8]> {
        self.check_key_index(index)?;
        let offset = self.key_offset(index)?;
        self.payload(offset, self.key_size())
    }

    pub fn set_key(&mut self, index: usize, key: &[u8]) -> TreeResult<()> {
        if key.len() != self.key_size() {
            return Err(TreeError::KeyWidth {
                expected: self.key_size(),
                found: key.len(),
            });
        }
        self.check_key_index(index)?;
        let offset = self.key_offset(index)?;
        self.payload_mut(offset, key.len())?.copy_from_slice(key);
        Ok(())
    }

    pub fn zero_key(&mut self, index: usize) -> TreeResult<()> {
        self.check_key_index(index)?;
        let offset = self.key_offset(index)?;
        let width = self.key_size();
        self.payload_mut(offset, width)?.fill(0);
        Ok(())
    }

    fn value_offset(&self, index: usize) -> TreeResult<usize> {
        match self.node_type() {
            NodeType::Leaf => Ok(NODE_HEADER_SIZE
                + index * (self.key_size() + self.value_size())
                + self.key_size()),
            other => Err(TreeError::BadNodeType(other)),
        }
    }

    pub fn value_at(&self, index: usize) -> TreeResult<&[u8]> {
        self.check_key_index(index)?;
        let offset = self.value_offset(index)?;
        self.payload(offset, self.value_size())
    }

    pub fn set_value(&mut self, index: usize, value: &[u8]) -> TreeResult<()> {
        if value.len() != self.value_size() {
            return Err(TreeError::ValueWidth {
                expected: self.value_size(),
                found: value.len(),
            });
        }
        self.check_key_index(index)?;
        let offset = self.value_offset(index)?;
        self.payload_mut(offset, value.len())?.copy_from_slice(value);
        Ok(())
    }

    pub fn zero_value(&mut self, index: usize) -> TreeResult<()> {
        self.check_key_index(index)?;
        let offset = self.value_offset(index)?;
        let width = self.value_size();
        self.payload_mut(offset, width)?.fill(0);
        Ok(())
    }

    fn ptr_offset(&self, index: usize) -> TreeResult<usize> {
        if !self.node_type().routes() {
            return Err(TreeError::BadNodeType(self.node_type()));
        }
        Ok(NODE_HEADER_SIZE + index * (PTR_SIZE + self.key_size()))
    }

    pub fn ptr_at(&self, index: usize) -> TreeResult<u32> {
        self.check_ptr_index(index)?;
        let offset = self.ptr_offset(index)?;
        let raw = self.payload(offset, PTR_SIZE)?;
        Ok(u32::from_le_bytes(raw.try_into().unwrap()))
    }

    pub fn set_ptr(&mut self, index: usize, block: u32) -> TreeResult<()> {
        self.check_ptr_index(index)?;
        let offset = self.ptr_offset(index)?;
        self.payload_mut(offset, PTR_SIZE)?
            .copy_from_slice(&block.to_le_bytes());
        Ok(())
    }

    pub fn zero_ptr(&mut self, index: usize) -> TreeResult<()> {
        self.set_ptr(index, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlockCache;

    const BLOCK: u32 = 64;

    fn leaf() -> Node {
        Node::new(NodeType::Leaf, 4, 4, BLOCK, 1)
    }

    fn interior() -> Node {
        Node::new(NodeType::Interior, 4, 4, BLOCK, 1)
    }

    #[test]
    fn header_size_is_28() {
        assert_eq!(std::mem::size_of::<NodeHeader>(), NODE_HEADER_SIZE);
    }

    #[test]
    fn node_type_from_byte() {
        assert_eq!(NodeType::from_byte(0x00), NodeType::Unallocated);
        assert_eq!(NodeType::from_byte(0x01), NodeType::Superblock);
        assert_eq!(NodeType::from_byte(0x02), NodeType::Root);
        assert_eq!(NodeType::from_byte(0x03), NodeType::Interior);
        assert_eq!(NodeType::from_byte(0x04), NodeType::Leaf);
        assert_eq!(NodeType::from_byte(0x77), NodeType::Unknown);
    }

    #[test]
    fn fresh_node_header_fields() {
        let node = Node::new(NodeType::Leaf, 4, 8, BLOCK, 3);

        assert_eq!(node.node_type(), NodeType::Leaf);
        assert_eq!(node.key_size(), 4);
        assert_eq!(node.value_size(), 8);
        assert_eq!(node.block_size(), BLOCK as usize);
        assert_eq!(node.num_keys(), 0);
        assert_eq!(node.root_block(), 3);
        assert_eq!(node.free_next(), 0);
    }

    #[test]
    fn capacity_formulas() {
        // (64 - 28) / (4 + 4) = 4 and (64 - 28 - 4) / (4 + 4) = 4
        assert_eq!(leaf().leaf_slots(), 4);
        assert_eq!(interior().interior_slots(), 4);
    }

    #[test]
    fn leaf_slot_round_trip() {
        let mut node = leaf();
        node.set_num_keys(2);

        node.set_key(0, b"aaaa").unwrap();
        node.set_value(0, b"1111").unwrap();
        node.set_key(1, b"bbbb").unwrap();
        node.set_value(1, b"2222").unwrap();

        assert_eq!(node.key_at(0).unwrap(), b"aaaa");
        assert_eq!(node.value_at(0).unwrap(), b"1111");
        assert_eq!(node.key_at(1).unwrap(), b"bbbb");
        assert_eq!(node.value_at(1).unwrap(), b"2222");
    }

    #[test]
    fn interior_slot_round_trip() {
        let mut node = interior();
        node.set_num_keys(2);

        node.set_ptr(0, 10).unwrap();
        node.set_key(0, b"mmmm").unwrap();
        node.set_ptr(1, 11).unwrap();
        node.set_key(1, b"rrrr").unwrap();
        node.set_ptr(2, 12).unwrap();

        assert_eq!(node.ptr_at(0).unwrap(), 10);
        assert_eq!(node.key_at(0).unwrap(), b"mmmm");
        assert_eq!(node.ptr_at(1).unwrap(), 11);
        assert_eq!(node.key_at(1).unwrap(), b"rrrr");
        assert_eq!(node.ptr_at(2).unwrap(), 12);
    }

    #[test]
    fn slot_access_past_num_keys_fails() {
        let mut node = leaf();
        node.set_num_keys(1);

        assert!(matches!(
            node.key_at(1),
            Err(TreeError::OutOfBounds { index: 1, numkeys: 1 })
        ));
        assert!(node.set_key(1, b"xxxx").is_err());
    }

    #[test]
    fn last_interior_pointer_is_addressable() {
        let mut node = interior();
        node.set_num_keys(1);

        node.set_ptr(1, 9).unwrap();

        assert_eq!(node.ptr_at(1).unwrap(), 9);
        assert!(matches!(node.ptr_at(2), Err(TreeError::OutOfBounds { .. })));
    }

    #[test]
    fn value_access_on_interior_fails() {
        let mut node = interior();
        node.set_num_keys(1);

        assert!(matches!(
            node.value_at(0),
            Err(TreeError::BadNodeType(NodeType::Interior))
        ));
    }

    #[test]
    fn pointer_access_on_leaf_fails() {
        let node = leaf();

        assert!(matches!(
            node.ptr_at(0),
            Err(TreeError::BadNodeType(NodeType::Leaf))
        ));
    }

    #[test]
    fn set_key_rejects_wrong_width() {
        let mut node = leaf();
        node.set_num_keys(1);

        assert!(matches!(
            node.set_key(0, b"toolong!"),
            Err(TreeError::KeyWidth { expected: 4, found: 8 })
        ));
    }

    #[test]
    fn zeroing_clears_slots() {
        let mut node = leaf();
        node.set_num_keys(1);
        node.set_key(0, b"aaaa").unwrap();
        node.set_value(0, b"1111").unwrap();

        node.zero_key(0).unwrap();
        node.zero_value(0).unwrap();

        assert_eq!(node.key_at(0).unwrap(), &[0u8; 4]);
        assert_eq!(node.value_at(0).unwrap(), &[0u8; 4]);
    }

    #[test]
    fn block_round_trip_through_cache() {
        let mut cache = MemoryBlockCache::new(BLOCK as usize, 2);
        let mut node = leaf();
        node.set_num_keys(1);
        node.set_key(0, b"kkkk").unwrap();
        node.set_value(0, b"vvvv").unwrap();

        node.write_to(&mut cache, 1).unwrap();
        let loaded = Node::read_from(&cache, 1).unwrap();

        assert_eq!(loaded.node_type(), NodeType::Leaf);
        assert_eq!(loaded.num_keys(), 1);
        assert_eq!(loaded.key_at(0).unwrap(), b"kkkk");
        assert_eq!(loaded.value_at(0).unwrap(), b"vvvv");
    }

    #[test]
    fn read_rejects_block_smaller_than_header() {
        let cache = MemoryBlockCache::new(16, 1);

        assert!(matches!(
            Node::read_from(&cache, 0),
            Err(TreeError::Insane(_))
        ));
    }
}
