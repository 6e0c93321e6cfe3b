//! Bit-addressable coordinates for nodes of a fixed-depth binary tree.
//!
//! A [`NodeId`] names a node by the path from the root toward it: bit 0 is
//! the first branching decision (0 = left), bit 1 the next, and so on. The
//! path is stored left-aligned in a byte buffer, so bit `k` is the
//! `(k % 8)`-th most significant bit of byte `k / 8`. This convention is
//! load-bearing: externally generated proofs address nodes the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for node coordinates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeIdError {
    /// The node index does not exist at the requested depth.
    #[error("index {index:#x} is too large for depth {depth}")]
    IndexTooLargeForDepth { index: u64, depth: usize },
    /// The depth lies below the bottom of the tree.
    #[error("depth {depth} exceeds the tree height {max_bits}")]
    DepthOutOfRange { depth: usize, max_bits: usize },
    /// The prefix does not fit the declared path or buffer.
    #[error("prefix of {prefix_bits} bits does not fit a {path_bits}-bit path in a {max_bits}-bit buffer")]
    PrefixOutOfRange {
        prefix_bits: usize,
        path_bits: usize,
        max_bits: usize,
    },
}

/// The address of a node in a balanced binary tree of fixed maximum depth.
///
/// `prefix_bits` is the number of meaningful leading bits of `path`;
/// everything after them is zero. `path_bits` is the length of a full
/// root-to-leaf path in the tree this id inhabits, so the node sits at
/// depth `path_bits - prefix_bits` above the leaves.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    path: Vec<u8>,
    prefix_bits: usize,
    path_bits: usize,
}

fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

impl NodeId {
    /// The root of a tree whose full paths are `max_bits` long.
    pub fn new_empty(max_bits: usize) -> Self {
        Self {
            path: vec![0u8; bytes_for_bits(max_bits)],
            prefix_bits: 0,
            path_bits: max_bits,
        }
    }

    /// Builds a node id whose first `prefix_bits` bits are copied from the
    /// most significant bits of `prefix`. The rest of the buffer is zero.
    pub fn new_with_prefix(
        prefix: &[u8],
        prefix_bits: usize,
        path_bits: usize,
        max_bits: usize,
    ) -> Result<Self, NodeIdError> {
        if prefix_bits > path_bits || path_bits > max_bits || prefix_bits > prefix.len() * 8 {
            return Err(NodeIdError::PrefixOutOfRange {
                prefix_bits,
                path_bits,
                max_bits,
            });
        }
        let mut path = vec![0u8; bytes_for_bits(max_bits)];
        let full = prefix_bits / 8;
        path[..full].copy_from_slice(&prefix[..full]);
        let rem = prefix_bits % 8;
        if rem != 0 {
            path[full] = prefix[full] & (0xff << (8 - rem));
        }
        Ok(Self {
            path,
            prefix_bits,
            path_bits,
        })
    }

    /// Builds the id of the node at `(depth, index)` in a perfect binary
    /// tree of height `max_bits`. Depth counts up from the leaves, so
    /// depth 0 addresses leaves and `index` must stay below
    /// `2^(max_bits - depth)`.
    pub fn new_for_tree_coords(
        depth: usize,
        index: u64,
        max_bits: usize,
    ) -> Result<Self, NodeIdError> {
        if depth > max_bits {
            return Err(NodeIdError::DepthOutOfRange { depth, max_bits });
        }
        let prefix_bits = max_bits - depth;
        if prefix_bits < 64 && index >= 1u64 << prefix_bits {
            return Err(NodeIdError::IndexTooLargeForDepth { index, depth });
        }
        let mut id = Self::new_empty(max_bits);
        id.prefix_bits = prefix_bits;
        for k in 0..prefix_bits {
            let src = prefix_bits - 1 - k;
            if src < 64 && (index >> src) & 1 == 1 {
                id.set_bit(k, 1);
            }
        }
        Ok(id)
    }

    /// Returns bit `k` of the path as 0 or 1. Bit 0 is the most
    /// significant bit of byte 0.
    pub fn bit(&self, k: usize) -> u8 {
        assert!(k < self.path.len() * 8, "bit index beyond the path buffer");
        (self.path[k / 8] >> (7 - k % 8)) & 1
    }

    /// Writes bit `k` of the path; any nonzero `bit` sets it.
    pub fn set_bit(&mut self, k: usize, bit: u8) {
        assert!(k < self.path.len() * 8, "bit index beyond the path buffer");
        let mask = 0x80 >> (k % 8);
        if bit == 0 {
            self.path[k / 8] &= !mask;
        } else {
            self.path[k / 8] |= mask;
        }
    }

    /// Number of meaningful leading bits.
    pub fn prefix_bits(&self) -> usize {
        self.prefix_bits
    }

    /// Length of a full root-to-leaf path in the tree this id inhabits.
    pub fn path_bits(&self) -> usize {
        self.path_bits
    }

    /// The raw path buffer, left-aligned.
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// Depth of the node above the leaves.
    pub fn depth(&self) -> usize {
        self.path_bits - self.prefix_bits
    }

    /// Renders the id as `[d:<depth>, i:<index>]`; the inverse of
    /// [`NodeId::new_for_tree_coords`] for indices that fit in a `u64`.
    pub fn coord_string(&self) -> String {
        let mut index: u64 = 0;
        for k in 0..self.prefix_bits {
            index = (index << 1) | u64::from(self.bit(k));
        }
        format!("[d:{}, i:{}]", self.depth(), index)
    }

    /// Returns the siblings of the nodes along the path from this node
    /// toward the root, deepest first: the sibling of the node itself
    /// (prefix length `prefix_bits`), then the sibling of its parent, and
    /// so on up to the sibling directly under the root (length 1). The
    /// sibling at length `l` is the `l`-bit prefix with its final bit
    /// inverted.
    pub fn siblings(&self) -> Vec<NodeId> {
        (1..=self.prefix_bits)
            .rev()
            .map(|l| {
                let mut sib = self.clone();
                sib.prefix_bits = l;
                let last = sib.bit(l - 1);
                sib.set_bit(l - 1, last ^ 1);
                sib.zero_suffix(l);
                sib
            })
            .collect()
    }

    /// Zeros every path bit from `from` onward.
    fn zero_suffix(&mut self, from: usize) {
        let byte = from / 8;
        let rem = from % 8;
        if rem != 0 {
            self.path[byte] &= 0xff << (8 - rem);
            for b in &mut self.path[byte + 1..] {
                *b = 0;
            }
        } else {
            for b in &mut self.path[byte..] {
                *b = 0;
            }
        }
    }

    /// Two ids are equivalent when they have the same number of prefix
    /// bits and those bits agree. Trailing path capacity may differ.
    pub fn equivalent(&self, other: &NodeId) -> bool {
        if self.prefix_bits != other.prefix_bits {
            return false;
        }
        let full = self.prefix_bits / 8;
        if self.path[..full] != other.path[..full] {
            return false;
        }
        let rem = self.prefix_bits % 8;
        if rem == 0 {
            return true;
        }
        let mask = 0xff << (8 - rem);
        self.path[full] & mask == other.path[full] & mask
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in 0..self.prefix_bits {
            write!(f, "{}", self.bit(k))?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NodeId(0x{}, {}/{} bits)",
            hex::encode(&self.path),
            self.prefix_bits,
            self.path_bits
        )
    }
}
