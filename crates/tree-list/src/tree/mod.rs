//! Core tree abstraction
//!
//! A forest of ordered, expandable nodes projected onto flat `(root, row)`
//! coordinates, fed lazily by a [`SourceAdapter`].

mod arena;
pub mod change;
pub mod filesystem;
mod node;
mod projector;
pub mod source;
pub mod store;
mod traversal;

pub use change::{affected_coordinates, Change, ChangeKind};
pub use filesystem::{EntryKind, FileData, FilesystemSource};
pub use node::{Coordinate, Node, NodeId, NodeRef, NodeSnapshot};
pub use source::{EmptySource, SourceAdapter, SourceItem, StaticSource};
pub use store::{InsertMode, MovePlan, TreeStore};
pub use traversal::TraversalOrder;

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        Change, Coordinate, FileData, FilesystemSource, InsertMode, Node, NodeId, NodeRef,
        SourceAdapter, SourceItem, StaticSource, TraversalOrder, TreeStore,
    };
}
