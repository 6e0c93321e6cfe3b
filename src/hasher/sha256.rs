//! SHA-256 map hasher.

use super::{HasherError, MapHasher, LEAF_HASH_PREFIX, NODE_HASH_PREFIX};
use crate::types::{NodeHash, TreeIndex};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::trace;

/// SHA-256 output width in bytes.
const DIGEST_SIZE: usize = 32;

/// A SHA-256 [`MapHasher`] for sparse maps.
///
/// Matches the test vectors produced by other sparse map implementations.
/// Because preimages are plain concatenations behind a one-byte domain
/// tag, without length framing, it does not offer the full 256-bit
/// collision resistance of the underlying hash in adversarial multi-party
/// settings; it is reference grade.
pub struct Sha256MapHasher {
    null_hashes: Vec<NodeHash>,
}

impl Sha256MapHasher {
    /// Creates the hasher and eagerly populates its null-hash ladder.
    pub fn new() -> Self {
        Self {
            null_hashes: init_null_hashes(),
        }
    }
}

impl Default for Sha256MapHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the cache of empty-subtree hashes, one per level of the sparse
/// tree, from the hash of an empty leaf up to the root hash of an empty
/// tree. Empty branches are never stored; their values are well known:
/// `E[0] = H(0x00)`, `E[k] = H(0x01 || E[k-1] || E[k-1])`.
fn init_null_hashes() -> Vec<NodeHash> {
    // Leaves sit at height 0, the root at size * 8, so the ladder has
    // size * 8 + 1 entries.
    let levels = DIGEST_SIZE * 8 + 1;
    let mut ladder = Vec::with_capacity(levels);
    ladder.push(leaf_digest(&[]));
    for k in 1..levels {
        ladder.push(children_digest(&ladder[k - 1], &ladder[k - 1]));
    }
    ladder
}

fn leaf_digest(leaf: &[u8]) -> NodeHash {
    Sha256::new()
        .chain_update([LEAF_HASH_PREFIX])
        .chain_update(leaf)
        .finalize()
        .to_vec()
}

fn children_digest(left: &[u8], right: &[u8]) -> NodeHash {
    Sha256::new()
        .chain_update([NODE_HASH_PREFIX])
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .to_vec()
}

impl MapHasher for Sha256MapHasher {
    fn size(&self) -> usize {
        DIGEST_SIZE
    }

    fn hash_empty(
        &self,
        tree_id: i64,
        index: &TreeIndex,
        height: usize,
    ) -> Result<NodeHash, HasherError> {
        let hash = self
            .null_hashes
            .get(height)
            .ok_or(HasherError::EmptyHashHeightOutOfRange {
                height,
                max: self.bit_len(),
            })?;
        trace!(tree_id, ?index, height, hash = %hex::encode(hash), "hash_empty");
        Ok(hash.clone())
    }

    fn hash_leaf(&self, tree_id: i64, index: &TreeIndex, height: usize, leaf: &[u8]) -> NodeHash {
        let hash = leaf_digest(leaf);
        trace!(tree_id, ?index, height, hash = %hex::encode(&hash), "hash_leaf");
        hash
    }

    fn hash_children(&self, left: &[u8], right: &[u8]) -> NodeHash {
        let hash = children_digest(left, right);
        trace!(
            left = %hex::encode(left),
            right = %hex::encode(right),
            hash = %hex::encode(&hash),
            "hash_children"
        );
        hash
    }
}

impl fmt::Debug for Sha256MapHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sha256MapHasher")
    }
}

impl fmt::Display for Sha256MapHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MapHasher{SHA256}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index0() -> TreeIndex {
        TreeIndex::zero(DIGEST_SIZE)
    }

    /// The hash of an empty leaf is SHA256(0x00).
    #[test]
    fn test_empty_leaf_hash() {
        let m = Sha256MapHasher::new();
        let want = hex::decode("6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d")
            .unwrap();
        assert_eq!(m.hash_leaf(0, &index0(), 0, b""), want);
        assert_eq!(m.hash_empty(0, &index0(), 0).unwrap(), want);
    }

    /// Every ladder entry above the base is the interior hash of two
    /// copies of the entry below it.
    #[test]
    fn test_null_hash_ladder() {
        let m = Sha256MapHasher::new();
        for k in 1..=m.bit_len() {
            let below = m.hash_empty(0, &index0(), k - 1).unwrap();
            assert_eq!(
                m.hash_empty(0, &index0(), k).unwrap(),
                m.hash_children(&below, &below),
                "ladder step {}",
                k
            );
        }
    }

    #[test]
    fn test_hash_empty_out_of_range() {
        let m = Sha256MapHasher::new();
        assert!(m.hash_empty(0, &index0(), 256).is_ok());
        assert_eq!(
            m.hash_empty(0, &index0(), 257),
            Err(HasherError::EmptyHashHeightOutOfRange {
                height: 257,
                max: 256
            })
        );
    }

    /// Leaf and interior preimages are exactly the domain prefix followed
    /// by the raw bytes; nothing else feeds the digest.
    #[test]
    fn test_wire_framing() {
        let m = Sha256MapHasher::new();

        let leaf = b"leaf data";
        let mut preimage = vec![LEAF_HASH_PREFIX];
        preimage.extend_from_slice(leaf);
        assert_eq!(
            m.hash_leaf(42, &index0(), 0, leaf),
            Sha256::digest(&preimage).to_vec()
        );

        let (l, r) = ([0x11u8; 32], [0x22u8; 32]);
        let mut preimage = vec![NODE_HASH_PREFIX];
        preimage.extend_from_slice(&l);
        preimage.extend_from_slice(&r);
        assert_eq!(m.hash_children(&l, &r), Sha256::digest(&preimage).to_vec());
    }

    /// The id and position arguments are observational only.
    #[test]
    fn test_position_does_not_feed_digest() {
        let m = Sha256MapHasher::new();
        let other = TreeIndex::from_u64(12345, DIGEST_SIZE).unwrap();
        assert_eq!(
            m.hash_leaf(1, &index0(), 0, b"x"),
            m.hash_leaf(99, &other, 200, b"x")
        );
        assert_eq!(
            m.hash_empty(1, &index0(), 5).unwrap(),
            m.hash_empty(99, &other, 5).unwrap()
        );
    }

    #[test]
    fn test_bit_len() {
        let m = Sha256MapHasher::new();
        assert_eq!(m.size(), 32);
        assert_eq!(m.bit_len(), 256);
        assert_eq!(m.to_string(), "MapHasher{SHA256}");
    }
}
