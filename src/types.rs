//! Define the value types used for sparse Merkle tree calculation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An opaque node or leaf digest, as wide as the active hasher's output.
pub type NodeHash = Vec<u8>;

/// Error type for index encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// The value needs more bytes than the target width provides.
    #[error("index needs {needed} bytes, capacity is {width}")]
    Overflow { needed: usize, width: usize },
    /// An index of the wrong width reached an engine boundary.
    #[error("index is {got} bytes wide, the hasher expects {want}")]
    WidthMismatch { got: usize, want: usize },
}

/// Encodes `index` as exactly `width` big-endian bytes, left padded with
/// zeros, e.g. `1` at width 4 becomes `00000001`.
pub fn padded_bytes(index: u64, width: usize) -> Result<Vec<u8>, IndexError> {
    let be = index.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    let needed = be.len() - skip;
    if needed > width {
        return Err(IndexError::Overflow { needed, width });
    }
    let mut out = vec![0u8; width];
    out[width - needed..].copy_from_slice(&be[skip..]);
    Ok(out)
}

/// A leaf or node index, stored as a fixed-width big-endian byte path.
///
/// The fixed-width representation replaces arbitrary-precision integers:
/// the engine only ever needs to compare indices, add a power of two, and
/// read the bytes back out, and all three are cheap byte-level operations
/// at a known width. The derived ordering is lexicographic, which for
/// equal widths is exactly the ascending numeric leaf order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeIndex {
    bytes: Vec<u8>,
}

impl TreeIndex {
    /// The zero index at the given width.
    pub fn zero(width: usize) -> Self {
        Self {
            bytes: vec![0u8; width],
        }
    }

    /// Encodes `index` at the given width.
    pub fn from_u64(index: u64, width: usize) -> Result<Self, IndexError> {
        Ok(Self {
            bytes: padded_bytes(index, width)?,
        })
    }

    /// Builds an index from big-endian bytes, left padding to `width`.
    /// Leading zero bytes in the input are ignored; significant bytes
    /// beyond `width` are rejected.
    pub fn from_be_bytes(bytes: &[u8], width: usize) -> Result<Self, IndexError> {
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        let significant = &bytes[skip..];
        if significant.len() > width {
            return Err(IndexError::Overflow {
                needed: significant.len(),
                width,
            });
        }
        let mut out = vec![0u8; width];
        out[width - significant.len()..].copy_from_slice(significant);
        Ok(Self { bytes: out })
    }

    /// Width of the index in bytes.
    pub fn width(&self) -> usize {
        self.bytes.len()
    }

    /// The big-endian bytes of the index.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `self + 2^exp`. The sum must fit in the index width.
    pub fn add_pow2(&self, exp: usize) -> Self {
        debug_assert!(exp < self.bytes.len() * 8, "exponent beyond index width");
        let mut bytes = self.bytes.clone();
        let mut pos = bytes.len() - 1 - exp / 8;
        let (sum, mut carry) = bytes[pos].overflowing_add(1 << (exp % 8));
        bytes[pos] = sum;
        while carry && pos > 0 {
            pos -= 1;
            let (sum, c) = bytes[pos].overflowing_add(1);
            bytes[pos] = sum;
            carry = c;
        }
        debug_assert!(!carry, "index addition overflowed the width");
        Self { bytes }
    }
}

impl fmt::Debug for TreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeIndex(0x{})", hex::encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies the fixed-width big-endian encoding, including the zero
    /// value and the exact-fit and overflow boundaries.
    #[test]
    fn test_padded_bytes() {
        assert_eq!(padded_bytes(0, 4).unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(padded_bytes(1, 4).unwrap(), vec![0, 0, 0, 1]);
        assert_eq!(padded_bytes(0x0102, 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(padded_bytes(u32::MAX as u64, 4).unwrap(), vec![0xff; 4]);

        let mut want = vec![0u8; 32];
        want[31] = 1;
        assert_eq!(padded_bytes(1, 32).unwrap(), want);

        assert_eq!(
            padded_bytes(1 << 32, 4),
            Err(IndexError::Overflow {
                needed: 5,
                width: 4
            })
        );
    }

    /// Ordering over equal widths must match numeric ordering.
    #[test]
    fn test_numeric_ordering() {
        let values = [0u64, 1, 2, 255, 256, 257, 1 << 20, u64::MAX];
        for pair in values.windows(2) {
            let a = TreeIndex::from_u64(pair[0], 32).unwrap();
            let b = TreeIndex::from_u64(pair[1], 32).unwrap();
            assert!(a < b, "{:?} should sort below {:?}", a, b);
        }
    }

    /// Scenarios tested:
    /// - adding a power of two into a clear bit position
    /// - carry propagation across byte boundaries
    /// - the engine's split step, `offset + 2^(n-1)`, on unaligned offsets
    #[test]
    fn test_add_pow2() {
        let zero = TreeIndex::zero(4);
        assert_eq!(zero.add_pow2(0), TreeIndex::from_u64(1, 4).unwrap());
        assert_eq!(zero.add_pow2(9), TreeIndex::from_u64(512, 4).unwrap());

        // 0x00ff + 1 carries into the next byte.
        let idx = TreeIndex::from_u64(0xff, 4).unwrap();
        assert_eq!(idx.add_pow2(0), TreeIndex::from_u64(0x100, 4).unwrap());

        // Carry chain across several bytes: 0x00ffffff + 1.
        let idx = TreeIndex::from_u64(0x00ff_ffff, 4).unwrap();
        assert_eq!(
            idx.add_pow2(0),
            TreeIndex::from_u64(0x0100_0000, 4).unwrap()
        );

        let idx = TreeIndex::from_u64(18, 32).unwrap();
        assert_eq!(idx.add_pow2(7), TreeIndex::from_u64(146, 32).unwrap());
        assert_eq!(idx.add_pow2(4), TreeIndex::from_u64(34, 32).unwrap());
    }

    /// Leading zeros are insignificant on input, and significant bytes
    /// wider than the target are rejected.
    #[test]
    fn test_from_be_bytes() {
        let idx = TreeIndex::from_be_bytes(&[0x12], 4).unwrap();
        assert_eq!(idx.as_bytes(), &[0, 0, 0, 0x12]);

        let idx = TreeIndex::from_be_bytes(&[0, 0, 0, 0, 0, 0x12], 4).unwrap();
        assert_eq!(idx.as_bytes(), &[0, 0, 0, 0x12]);

        assert_eq!(TreeIndex::from_be_bytes(&[], 2).unwrap(), TreeIndex::zero(2));

        assert_eq!(
            TreeIndex::from_be_bytes(&[1, 0, 0], 2),
            Err(IndexError::Overflow {
                needed: 3,
                width: 2
            })
        );
    }
}
