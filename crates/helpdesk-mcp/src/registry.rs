//! Generic descriptor registry
//!
//! Populated once at startup, immutable afterwards. Lookup order is
//! irrelevant; listing preserves insertion order.

use rustc_hash::FxHashMap;

use crate::error::{BridgeError, Result};

/// Types that carry their own unique registry key
pub trait Keyed {
    /// The unique key this descriptor is registered under
    fn key(&self) -> &str;
}

/// Insertion-ordered mapping from descriptor key to descriptor
///
/// Shared as `Arc<Registry<D>>` after startup, so the read path needs no
/// locking.
#[derive(Debug)]
pub struct Registry<D> {
    entries: Vec<D>,
    index: FxHashMap<String, usize>,
}

impl<D: Keyed> Registry<D> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Register a descriptor; duplicate keys are a startup fault
    pub fn register(&mut self, descriptor: D) -> Result<()> {
        let key = descriptor.key().to_string();
        if self.index.contains_key(&key) {
            return Err(BridgeError::internal(format!(
                "duplicate registration for '{key}'"
            )));
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(descriptor);
        Ok(())
    }

    /// Look up a descriptor by key
    pub fn get(&self, key: &str) -> Option<&D> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Iterate descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.entries.iter()
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: Keyed> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}
