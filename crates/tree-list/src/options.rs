//! Configuration options for a tree store.
//!
//! This module provides the `TreeOptions` struct which controls how the
//! store materializes nodes from its source and how the background
//! mutation queue is set up.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// When a node's children are pulled from the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoadPolicy {
    /// Pull the whole tree during a load, down to every leaf.
    #[default]
    Eager,
    /// Pull a node's children the first time it is expanded.
    Lazy,
}

/// Configuration options for a tree store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeOptions {
    /// When children are pulled from the source.
    pub load_policy: LoadPolicy,

    /// Whether freshly loaded roots start expanded, regardless of what the
    /// source reports.
    pub expand_roots: bool,

    /// Thread name of the background mutation worker.
    pub worker_name: String,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            load_policy: LoadPolicy::default(),
            expand_roots: false,
            worker_name: "tree-list-worker".to_string(),
        }
    }
}

impl TreeOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the load policy.
    pub fn load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    /// Shorthand for `load_policy(LoadPolicy::Lazy)`.
    pub fn lazy(self) -> Self {
        self.load_policy(LoadPolicy::Lazy)
    }

    /// Start loaded roots expanded.
    pub fn expand_roots(mut self, expand: bool) -> Self {
        self.expand_roots = expand;
        self
    }

    /// Set the worker thread name.
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Returns true if children are pulled on first expansion.
    pub fn is_lazy(&self) -> bool {
        self.load_policy == LoadPolicy::Lazy
    }
}
