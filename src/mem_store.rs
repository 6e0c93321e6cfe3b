//! In-memory storage backend for sparse Merkle tree nodes.
//!
//! This module provides [`MemStore`], a simple in-memory backend that
//! implements the [`NodeStore`] trait over a [`BTreeMap`]. It is intended
//! for unit and integration testing, development, and as a reference
//! implementation of the storage trait; production deployments back the
//! trait with a database instead.
//!
//! All access is thread-safe through a [`RwLock`], allowing multiple
//! concurrent readers or a single writer.

use crate::{
    traits::NodeStore,
    types::{NodeHash, TreeIndex},
};
use std::{collections::BTreeMap, sync::RwLock};

/// In-memory node hash storage, keyed by `(level, index)`.
#[derive(Debug, Default)]
pub struct MemStore {
    nodes: RwLock<BTreeMap<(usize, TreeIndex), NodeHash>>,
}

impl Clone for MemStore {
    fn clone(&self) -> Self {
        Self {
            nodes: RwLock::new(self.nodes.read().expect("node lock poisoned").clone()),
        }
    }
}

impl MemStore {
    /// Creates a new empty `MemStore` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of node hashes currently stored.
    pub fn node_count(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    /// Reads a stored node hash back out, bypassing the trait.
    pub fn node(&self, level: usize, index: &TreeIndex) -> Option<NodeHash> {
        self.nodes
            .read()
            .unwrap()
            .get(&(level, index.clone()))
            .cloned()
    }
}

impl NodeStore for MemStore {
    /// Uses static string references for simplicity in this in-memory
    /// implementation.
    type Error = &'static str;

    fn get_node(&self, level: usize, index: &TreeIndex) -> Result<Option<NodeHash>, Self::Error> {
        Ok(self
            .nodes
            .read()
            .unwrap()
            .get(&(level, index.clone()))
            .cloned())
    }

    fn set_node(
        &self,
        level: usize,
        index: &TreeIndex,
        hash: &NodeHash,
    ) -> Result<(), Self::Error> {
        self.nodes
            .write()
            .unwrap()
            .insert((level, index.clone()), hash.clone());
        Ok(())
    }
}
