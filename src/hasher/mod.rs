//! Domain-separated hashing for sparse Merkle maps.
//!
//! A [`MapHasher`] produces the three kinds of hashes a sparse Merkle tree
//! is built from: leaf hashes, interior node hashes, and the precomputed
//! hashes of perfect empty subtrees (the null-hash ladder). Leaf and
//! interior preimages carry distinct one-byte domain prefixes so that no
//! interior hash can be mistaken for a leaf hash and vice versa.

use crate::types::{NodeHash, TreeIndex};
use std::fmt;
use thiserror::Error;

pub mod registry;
pub mod sha256;

pub use registry::{
    new_map_hasher, register_map_hasher, HasherRegistry, MapHasherFactory, RegistryError,
    SHA256_MAP_HASHER,
};
pub use sha256::Sha256MapHasher;

/// Domain prefix of a leaf hash preimage: `0x00 || leaf`.
pub const LEAF_HASH_PREFIX: u8 = 0;
/// Domain prefix of an interior hash preimage: `0x01 || left || right`.
pub const NODE_HASH_PREFIX: u8 = 1;

/// Error type for map hashing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HasherError {
    /// The requested empty-subtree height has no ladder entry.
    #[error("empty hash height {height} out of range [0, {max}]")]
    EmptyHashHeightOutOfRange { height: usize, max: usize },
}

/// Hash abstraction used by the sparse Merkle tree engine.
///
/// Implementations are immutable after construction and shareable across
/// threads. `tree_id`, `index` and `height` are observational: they feed
/// diagnostics, never the digest.
pub trait MapHasher: fmt::Debug + Send + Sync {
    /// Digest width in bytes.
    fn size(&self) -> usize;

    /// Number of bits in the hash, which is also the height of a full
    /// sparse Merkle tree built with it.
    fn bit_len(&self) -> usize {
        self.size() * 8
    }

    /// Returns the hash of an empty subtree of the given height. Height 0
    /// is the hash of an empty leaf. The lookup fails outside
    /// `[0, bit_len]`.
    fn hash_empty(
        &self,
        tree_id: i64,
        index: &TreeIndex,
        height: usize,
    ) -> Result<NodeHash, HasherError>;

    /// Returns the Merkle leaf hash of `leaf`.
    fn hash_leaf(&self, tree_id: i64, index: &TreeIndex, height: usize, leaf: &[u8]) -> NodeHash;

    /// Returns the interior node hash of the two child hashes.
    fn hash_children(&self, left: &[u8], right: &[u8]) -> NodeHash;
}
