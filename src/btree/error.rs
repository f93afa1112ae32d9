//! Error kinds surfaced by the index.
//!
//! Expected outcomes (`Nonexistent`, `Conflict`, `NoSpace`) are part of the
//! API contract and worth matching on; `BadNodeType`, `OutOfBounds` and
//! `Insane` indicate corruption or a caller bug and are not expected in
//! normal operation. Device failures bubble up unchanged inside `Storage`.

use thiserror::Error;

use super::node::NodeType;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("key not found")]
    Nonexistent,

    #[error("key already present")]
    Conflict,

    #[error("free list exhausted")]
    NoSpace,

    #[error("unexpected node type {0:?}")]
    BadNodeType(NodeType),

    #[error("slot {index} out of range for {numkeys} keys")]
    OutOfBounds { index: usize, numkeys: usize },

    #[error("key is {found} bytes, index configured for {expected}")]
    KeyWidth { expected: usize, found: usize },

    #[error("value is {found} bytes, index configured for {expected}")]
    ValueWidth { expected: usize, found: usize },

    #[error("index structure violated: {0}")]
    Insane(&'static str),

    #[error("delete is reserved and not implemented")]
    Unimplemented,

    #[error("display sink error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(eyre::Report),
}

impl From<eyre::Report> for TreeError {
    fn from(report: eyre::Report) -> Self {
        TreeError::Storage(report)
    }
}
