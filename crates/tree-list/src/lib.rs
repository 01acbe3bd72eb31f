//! Tree List Library
//!
//! A multi-root tree of expandable nodes presented as a flat, sectioned
//! list. Each root is a section header; its visible descendants are the
//! section's rows, numbered in pre-order.
//!
//! # Core Concepts
//!
//! - **SourceAdapter**: supplies roots and children on demand
//! - **TreeStore**: owns the forest, maps identities and coordinates to nodes
//! - **TreeList**: batches edits and reports ordered changes to listeners
//! - **TreeWorker**: serializes edits from many threads onto one writer
//!
//! # Example
//!
//! ```no_run
//! use tree_list::prelude::*;
//!
//! let source = FilesystemSource::new("./src").expect("Failed to open directory");
//! let mut list = TreeList::with_options(source, TreeOptions::new().lazy());
//! list.load_roots();
//!
//! let root = list.store().roots().next().cloned().expect("one root");
//! list.expand(&root).expect("root exists");
//!
//! for row in 0..list.visible_row_count(0) {
//!     let node = list.node_at(Coordinate::new(0, row)).unwrap();
//!     println!("{:indent$}{}", "", node.payload, indent = node.level * 2);
//! }
//! ```

pub mod batch;
pub mod error;
pub mod list;
pub mod options;
pub mod tree;
pub mod worker;

pub use error::{Result, TreeError};
pub use list::TreeList;
pub use options::{LoadPolicy, TreeOptions};
pub use worker::TreeWorker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::batch::{BatchScheduler, OpKind};
    pub use crate::error::{Result, TreeError};
    pub use crate::list::TreeList;
    pub use crate::options::{LoadPolicy, TreeOptions};
    pub use crate::tree::prelude::*;
    pub use crate::worker::TreeWorker;
}
