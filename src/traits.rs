//! Define the storage seam between the HStar2 engine and its callers.

use crate::types::{NodeHash, TreeIndex};
use std::convert::Infallible;
use std::fmt::Debug;

/// Read/write access to the materialized interior node hashes of a sparse
/// Merkle (sub)tree.
///
/// The engine consults [`get_node`](NodeStore::get_node) whenever it
/// recurses into a region with no remaining leaves; a `None` answer means
/// "nothing stored, use the empty-subtree hash for that level". Every
/// freshly combined interior hash is handed to
/// [`set_node`](NodeStore::set_node). Within one computation, all gets for
/// a branch happen before that branch's set, and deeper sets happen before
/// shallower ones on the same path; no other ordering is guaranteed.
///
/// `level` counts down from the root of the subtree being computed: level
/// 0 addresses the subtree root itself, level `subtree_depth` its deepest
/// nodes. `index` is the index of the leftmost leaf below the node, in the
/// coordinate space of the whole tree.
///
/// Writes take `&self`; implementations that mutate use interior
/// mutability. Rewriting a slot with the hash it already holds must be
/// safe.
pub trait NodeStore {
    /// Custom trait's error type. Errors pass through the engine unchanged.
    type Error: Debug + Send;

    /// Returns the stored hash for the node at `(level, index)`, if any.
    fn get_node(&self, level: usize, index: &TreeIndex) -> Result<Option<NodeHash>, Self::Error>;

    /// Stores `hash` for the node at `(level, index)`.
    fn set_node(&self, level: usize, index: &TreeIndex, hash: &NodeHash)
        -> Result<(), Self::Error>;
}

/// A [`NodeStore`] with nothing in it: reads always miss and writes are
/// discarded. Computing against it yields the hashes of an all-empty tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyNodes;

impl NodeStore for EmptyNodes {
    type Error = Infallible;

    fn get_node(&self, _level: usize, _index: &TreeIndex) -> Result<Option<NodeHash>, Self::Error> {
        Ok(None)
    }

    fn set_node(
        &self,
        _level: usize,
        _index: &TreeIndex,
        _hash: &NodeHash,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}
