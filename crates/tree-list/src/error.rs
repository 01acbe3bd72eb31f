//! Errors reported by tree operations
//!
//! Every error is recoverable: an operation that fails leaves the tree
//! exactly as it was.

use derive_more::Display;

use crate::tree::{Coordinate, NodeId};

/// Error returned by store and list operations
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TreeError {
    /// The identity does not resolve to a node (or not within the given root)
    #[display(fmt = "node {} not found", _0)]
    NotFound(NodeId),

    /// The coordinate does not address a visible node, or addresses a
    /// position the operation cannot use
    #[display(fmt = "invalid coordinate {}", _0)]
    InvalidCoordinate(Coordinate),

    /// An insert would duplicate an identity already in the forest
    #[display(fmt = "node {} already exists", _0)]
    AlreadyExists(NodeId),
}

impl std::error::Error for TreeError {}

/// Result alias for tree operations
pub type Result<T, E = TreeError> = std::result::Result<T, E>;
