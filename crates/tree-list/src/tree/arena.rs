//! Node storage
//!
//! Nodes live in a generational [`SlotMap`]. A [`Key`] is the non-owning
//! handle used for parent back-references and child lists; once its node
//! is removed the key stops resolving, even after the slot is reused.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a stored node
    pub(crate) struct Key;
}

pub(crate) type Arena<T> = SlotMap<Key, T>;
