//! Process-wide registry of map-hash strategies.
//!
//! Proof producers and verifiers agree on a hash strategy by name; the
//! registry maps each name to a factory for the corresponding hasher.
//! It is populated at process startup and read-only thereafter: the first
//! successful lookup freezes an instance, and later registrations fail
//! instead of mutating a map that readers may already depend on.

use super::{MapHasher, Sha256MapHasher};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Identifier of the builtin SHA-256 map-hash strategy.
pub const SHA256_MAP_HASHER: &str = "SHA256_MAP_HASHER";

/// Builds a shareable hasher instance for a registered strategy.
pub type MapHasherFactory = fn() -> Arc<dyn MapHasher>;

/// Error type for the strategy registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The strategy name is already taken.
    #[error("hash strategy {0:?} is already registered")]
    AlreadyRegistered(&'static str),
    /// Registration arrived after the registry was first read.
    #[error("registry is frozen, cannot register {0:?} after the first lookup")]
    Frozen(&'static str),
    /// No factory is registered under the requested name.
    #[error("unknown hash strategy {0:?}")]
    UnknownStrategy(String),
}

#[derive(Default)]
struct Inner {
    factories: HashMap<&'static str, MapHasherFactory>,
    frozen: bool,
}

/// Maps strategy identifiers to hasher factories.
#[derive(Default)]
pub struct HasherRegistry {
    inner: RwLock<Inner>,
}

impl HasherRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `strategy`. Fails once the registry has
    /// served a lookup, or when the name is taken.
    pub fn register(
        &self,
        strategy: &'static str,
        factory: MapHasherFactory,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if inner.frozen {
            return Err(RegistryError::Frozen(strategy));
        }
        if inner.factories.contains_key(strategy) {
            return Err(RegistryError::AlreadyRegistered(strategy));
        }
        inner.factories.insert(strategy, factory);
        Ok(())
    }

    /// Builds a hasher for `strategy`. The first successful lookup
    /// freezes the registry against further registration; a miss leaves
    /// it open, so probing an unregistered name does not lock anyone out.
    pub fn new_hasher(&self, strategy: &str) -> Result<Arc<dyn MapHasher>, RegistryError> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        match inner.factories.get(strategy).copied() {
            Some(factory) => {
                inner.frozen = true;
                Ok(factory())
            }
            None => Err(RegistryError::UnknownStrategy(strategy.to_string())),
        }
    }
}

fn sha256_factory() -> Arc<dyn MapHasher> {
    Arc::new(Sha256MapHasher::new())
}

/// The process-wide registry, pre-populated with the builtin strategies.
static DEFAULT_REGISTRY: Lazy<HasherRegistry> = Lazy::new(|| {
    let registry = HasherRegistry::new();
    registry
        .register(SHA256_MAP_HASHER, sha256_factory)
        .expect("fresh registry accepts the builtin strategy");
    registry
});

/// Registers `factory` in the process-wide registry. Call during startup,
/// before any lookup.
pub fn register_map_hasher(
    strategy: &'static str,
    factory: MapHasherFactory,
) -> Result<(), RegistryError> {
    DEFAULT_REGISTRY.register(strategy, factory)
}

/// Builds a hasher for `strategy` from the process-wide registry.
pub fn new_map_hasher(strategy: &str) -> Result<Arc<dyn MapHasher>, RegistryError> {
    DEFAULT_REGISTRY.new_hasher(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Registration, lookup, duplicate rejection, and the freeze guard,
    /// on a private registry instance.
    #[test]
    fn test_register_and_freeze() {
        let registry = HasherRegistry::new();
        registry.register("test", sha256_factory).unwrap();

        assert_eq!(
            registry.register("test", sha256_factory),
            Err(RegistryError::AlreadyRegistered("test"))
        );

        let hasher = registry.new_hasher("test").unwrap();
        assert_eq!(hasher.size(), 32);

        // The first successful lookup froze the registry.
        assert_eq!(
            registry.register("late", sha256_factory),
            Err(RegistryError::Frozen("late"))
        );
    }

    /// A failed lookup does not freeze: probing an unregistered name
    /// before startup registration finishes must not lock the registry.
    #[test]
    fn test_failed_lookup_does_not_freeze() {
        let registry = HasherRegistry::new();

        let err = registry.new_hasher("not-yet").unwrap_err();
        assert_eq!(err, RegistryError::UnknownStrategy("not-yet".to_string()));

        // Registration still works after the miss.
        registry.register("not-yet", sha256_factory).unwrap();
        let hasher = registry.new_hasher("not-yet").unwrap();
        assert_eq!(hasher.bit_len(), 256);

        // Only now is the registry frozen.
        assert_eq!(
            registry.register("late", sha256_factory),
            Err(RegistryError::Frozen("late"))
        );
    }

    #[test]
    fn test_unknown_strategy() {
        let registry = HasherRegistry::new();
        let err = registry.new_hasher("nope").unwrap_err();
        assert_eq!(err, RegistryError::UnknownStrategy("nope".to_string()));
    }

    /// The process-wide registry serves the builtin SHA-256 strategy.
    #[test]
    fn test_default_registry() {
        let hasher = new_map_hasher(SHA256_MAP_HASHER).unwrap();
        assert_eq!(hasher.bit_len(), 256);
    }
}
