#![doc = include_str!("../README.md")]

pub mod hasher;
pub use hasher::{
    new_map_hasher, register_map_hasher, HasherError, HasherRegistry, MapHasher, MapHasherFactory,
    RegistryError, Sha256MapHasher, SHA256_MAP_HASHER,
};
pub mod hstar2;
pub use hstar2::{HStar2, HStar2Error, HStar2LeafHash};
pub mod node_id;
pub use node_id::{NodeId, NodeIdError};
pub mod traits;
pub use traits::{EmptyNodes, NodeStore};
pub mod types;
pub use types::{padded_bytes, IndexError, NodeHash, TreeIndex};
pub mod mem_store;
pub use mem_store::MemStore;
