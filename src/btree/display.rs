//! Textual views of a tree, written to any `io::Write` sink.
//!
//! Three modes:
//!
//! ```text
//! Depth         pre-order, one line per node with pointers and raw keys
//! Dot           Graphviz digraph with the same node lines as labels
//! SortedKeyval  in-order "(key,value)" lines from the leaves
//! ```
//!
//! Keys and values are emitted as raw bytes, so the output is only as
//! printable as the data.

use std::io::Write;

use super::error::{TreeError, TreeResult};
use super::node::{Node, NodeType};
use super::tree::BTreeIndex;
use crate::storage::BlockCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Depth-first listing, one node per line.
    Depth,
    /// Graphviz DOT export.
    Dot,
    /// In-order key/value dump.
    SortedKeyval,
}

impl<C: BlockCache> BTreeIndex<C> {
    /// Writes a textual rendering of the tree to `out`.
    pub fn display(&self, out: &mut dyn Write, mode: DisplayMode) -> TreeResult<()> {
        if mode == DisplayMode::Dot {
            writeln!(out, "digraph tree {{")?;
        }
        self.display_subtree(out, mode, self.root_block())?;
        if mode == DisplayMode::Dot {
            writeln!(out, "}}")?;
        }
        Ok(())
    }

    fn display_subtree(&self, out: &mut dyn Write, mode: DisplayMode, block: u32) -> TreeResult<()> {
        let node = Node::read_from(self.cache(), block)?;
        match node.node_type() {
            t if t.routes() => {
                match mode {
                    DisplayMode::Depth => {
                        write!(out, "{}: Interior:", block)?;
                        write_routing_slots(out, &node)?;
                        writeln!(out)?;
                    }
                    DisplayMode::Dot => {
                        write!(out, "{} [ label=\"{}:", block, block)?;
                        write_routing_slots(out, &node)?;
                        writeln!(out, "\" ];")?;
                    }
                    DisplayMode::SortedKeyval => {}
                }
                if node.num_keys() > 0 {
                    for slot in 0..=node.num_keys() {
                        let child = node.ptr_at(slot)?;
                        if mode == DisplayMode::Dot {
                            writeln!(out, "{} -> {};", block, child)?;
                        }
                        self.display_subtree(out, mode, child)?;
                    }
                }
                Ok(())
            }
            NodeType::Leaf => {
                match mode {
                    DisplayMode::Depth => {
                        write!(out, "{}: Leaf:", block)?;
                        write_leaf_slots(out, &node, b" ", b" ", b"")?;
                        writeln!(out)?;
                    }
                    DisplayMode::Dot => {
                        write!(out, "{} [ label=\"{}:", block, block)?;
                        write_leaf_slots(out, &node, b" ", b" ", b"")?;
                        writeln!(out, "\" ];")?;
                    }
                    DisplayMode::SortedKeyval => {
                        write_leaf_slots(out, &node, b"(", b",", b")\n")?;
                    }
                }
                Ok(())
            }
            _ => Err(TreeError::Insane("display reached a non-tree block")),
        }
    }
}

fn write_routing_slots(out: &mut dyn Write, node: &Node) -> TreeResult<()> {
    for slot in 0..node.num_keys() {
        write!(out, " *{} ", node.ptr_at(slot)?)?;
        out.write_all(node.key_at(slot)?)?;
    }
    if node.num_keys() > 0 {
        write!(out, " *{}", node.ptr_at(node.num_keys())?)?;
    }
    Ok(())
}

fn write_leaf_slots(
    out: &mut dyn Write,
    node: &Node,
    open: &[u8],
    mid: &[u8],
    close: &[u8],
) -> TreeResult<()> {
    for slot in 0..node.num_keys() {
        out.write_all(open)?;
        out.write_all(node.key_at(slot)?)?;
        out.write_all(mid)?;
        out.write_all(node.value_at(slot)?)?;
        out.write_all(close)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlockCache;

    fn small_tree() -> BTreeIndex<MemoryBlockCache> {
        let cache = MemoryBlockCache::new(64, 16);
        let mut index = BTreeIndex::attach(cache, 4, 4, 0, true).unwrap();
        index.insert(b"0005", b"AAAA").unwrap();
        index.insert(b"0002", b"BBBB").unwrap();
        index.insert(b"0007", b"CCCC").unwrap();
        index
    }

    fn render(index: &BTreeIndex<MemoryBlockCache>, mode: DisplayMode) -> String {
        let mut out = Vec::new();
        index.display(&mut out, mode).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn sorted_keyval_is_in_order() {
        let index = small_tree();

        let text = render(&index, DisplayMode::SortedKeyval);

        assert_eq!(text, "(0002,BBBB)\n(0005,AAAA)\n(0007,CCCC)\n");
    }

    #[test]
    fn depth_lists_every_node_once() {
        let index = small_tree();

        let text = render(&index, DisplayMode::Depth);

        assert_eq!(text.matches("Interior:").count(), 1);
        assert_eq!(text.matches("Leaf:").count(), 2);
        assert!(text.contains("0005"));
    }

    #[test]
    fn dot_output_is_framed_with_edges() {
        let index = small_tree();

        let text = render(&index, DisplayMode::Dot);

        assert!(text.starts_with("digraph tree {\n"));
        assert!(text.ends_with("}\n"));
        // Root with one separator has two outgoing edges.
        assert_eq!(text.matches("->").count(), 2);
    }

    #[test]
    fn empty_tree_dumps_nothing() {
        let cache = MemoryBlockCache::new(64, 4);
        let index = BTreeIndex::attach(cache, 4, 4, 0, true).unwrap();

        assert_eq!(render(&index, DisplayMode::SortedKeyval), "");
    }
}
