//! Recursive root calculation for sparse Merkle trees.
//!
//! The HStar2 algorithm computes the root of a tree of height `n` holding
//! `k` non-null leaves in `O(k log n)` hash operations: it splits the
//! sorted leaves around the midpoint of the current index range, recurses
//! into both halves, and substitutes a precomputed null hash (or a stored
//! interior hash) for any half with no leaves left in it.

use crate::{
    hasher::{HasherError, MapHasher},
    traits::NodeStore,
    types::{IndexError, NodeHash, TreeIndex},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;
use tracing::trace;

/// A non-null leaf of a sparse Merkle tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HStar2LeafHash {
    /// Position of the leaf, at the width of the hasher in use.
    pub index: TreeIndex,
    /// Hash of the leaf data.
    pub leaf_hash: NodeHash,
}

/// Errors produced by [`HStar2`] computations. None of them are
/// retryable, and store errors pass through uninterpreted.
#[derive(Debug, Error)]
pub enum HStar2Error<E> {
    /// The requested subtree extends below the bottom of the tree.
    #[error("tree level offset cannot be negative")]
    NegativeTreeLevelOffset,
    /// More than one leaf reached the bottom of the recursion, which
    /// means the input carried duplicate indices.
    #[error("base case reached with {got} leaves, want 1")]
    BaseCaseArityMismatch { got: usize },
    /// The hasher rejected a call.
    #[error(transparent)]
    Hasher(#[from] HasherError),
    /// A leaf index had the wrong shape for the hasher in use.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// An error returned by the caller-supplied node store, unchanged.
    #[error("node store: {0:?}")]
    Store(E),
}

/// Sparse Merkle tree root calculator.
///
/// Stateless between calls: it holds only the tree id used in diagnostics
/// and a borrowed hasher, so one instance may serve any number of threads.
#[derive(Debug)]
pub struct HStar2<'a, H: MapHasher + ?Sized> {
    tree_id: i64,
    hasher: &'a H,
}

impl<'a, H: MapHasher + ?Sized> HStar2<'a, H> {
    /// Creates a calculator for `tree_id` on top of `hasher`.
    pub fn new(tree_id: i64, hasher: &'a H) -> Self {
        Self { tree_id, hasher }
    }

    /// Computes the root of a sparse Merkle tree of height `n` whose only
    /// non-null leaves are `values`.
    ///
    /// The result depends on `n` and the set of `(index, leaf_hash)`
    /// pairs, not on their order and not on the tree id.
    pub fn root(
        &self,
        n: usize,
        mut values: Vec<HStar2LeafHash>,
    ) -> Result<NodeHash, HStar2Error<Infallible>> {
        trace!(n, leaves = values.len(), "hstar2 root");
        self.check_widths(&values)?;
        values.sort_unstable_by(|a, b| a.index.cmp(&b.index));
        self.compute(
            n,
            &values,
            &TreeIndex::zero(self.hasher.size()),
            &|height, index| Ok(self.hasher.hash_empty(self.tree_id, index, height)?),
            &|_, _, _| Ok(()),
        )
    }

    /// Computes the root of the subtree rooted at `(depth, index_prefix)`
    /// in a tree of total height `bit_len`, spanning `subtree_depth`
    /// levels downward.
    ///
    /// `index_prefix` is the big-endian index of the subtree root among
    /// the nodes of its level; leaf indices in `values` must lie within
    /// the subtree, i.e. in `[prefix, prefix + 2^subtree_depth)` (not
    /// enforced). `store` supplies pre-existing interior hashes wherever
    /// the recursion runs out of leaves and receives every interior hash
    /// this call computes; the level passed to it counts down from the
    /// subtree root (level 0) to the deepest nodes (level
    /// `subtree_depth`).
    ///
    /// Duplicate leaf indices are not rejected up front; they travel down
    /// the recursion and surface as
    /// [`HStar2Error::BaseCaseArityMismatch`].
    pub fn subtree<S: NodeStore>(
        &self,
        index_prefix: &[u8],
        depth: usize,
        subtree_depth: usize,
        mut values: Vec<HStar2LeafHash>,
        store: &S,
    ) -> Result<NodeHash, HStar2Error<S::Error>> {
        let bit_len = self.hasher.bit_len();
        if depth + subtree_depth > bit_len {
            return Err(HStar2Error::NegativeTreeLevelOffset);
        }
        let level_offset = bit_len - depth - subtree_depth;
        trace!(
            depth,
            subtree_depth,
            level_offset,
            leaves = values.len(),
            "hstar2 subtree"
        );
        self.check_widths(&values)?;
        values.sort_unstable_by(|a, b| a.index.cmp(&b.index));
        let offset = TreeIndex::from_be_bytes(index_prefix, self.hasher.size())?;
        self.compute(
            subtree_depth,
            &values,
            &offset,
            &|height, index| {
                // A stored value wins; otherwise fall back to the null
                // hash for the absolute height of this node.
                match store
                    .get_node(subtree_depth - height, index)
                    .map_err(HStar2Error::Store)?
                {
                    Some(hash) => Ok(hash),
                    None => Ok(self
                        .hasher
                        .hash_empty(self.tree_id, index, height + level_offset)?),
                }
            },
            &|height, index, hash| {
                store
                    .set_node(subtree_depth - height, index, hash)
                    .map_err(HStar2Error::Store)
            },
        )
    }

    /// Rejects leaves whose index width differs from the hasher width.
    fn check_widths<E>(&self, values: &[HStar2LeafHash]) -> Result<(), HStar2Error<E>> {
        let want = self.hasher.size();
        for v in values {
            if v.index.width() != want {
                return Err(IndexError::WidthMismatch {
                    got: v.index.width(),
                    want,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Recursive core. `values` must be sorted ascending by index, and
    /// `offset` is the index of the leftmost leaf under the current node,
    /// which sits `n` levels above the leaves.
    fn compute<E>(
        &self,
        n: usize,
        values: &[HStar2LeafHash],
        offset: &TreeIndex,
        get: &dyn Fn(usize, &TreeIndex) -> Result<NodeHash, HStar2Error<E>>,
        set: &dyn Fn(usize, &TreeIndex, &NodeHash) -> Result<(), HStar2Error<E>>,
    ) -> Result<NodeHash, HStar2Error<E>> {
        if n == 0 {
            return match values {
                [] => get(0, offset),
                [leaf] => Ok(leaf.leaf_hash.clone()),
                _ => Err(HStar2Error::BaseCaseArityMismatch { got: values.len() }),
            };
        }
        if values.is_empty() {
            return get(n, offset);
        }

        let split = offset.add_pow2(n - 1);
        let i = values.partition_point(|v| v.index < split);
        let lhs = self.compute(n - 1, &values[..i], offset, get, set)?;
        let rhs = self.compute(n - 1, &values[i..], &split, get, set)?;
        let parent = self.hasher.hash_children(&lhs, &rhs);
        set(n, offset, &parent)?;
        Ok(parent)
    }
}
