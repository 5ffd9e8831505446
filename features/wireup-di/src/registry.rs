use std::collections::{hash_map::Entry, HashMap};

use crate::{
    binding::{Binding, DuplicatePolicy},
    errors::RegistryError,
    types::Key,
};

/// Bindings owned by a single container, keyed by [Key]
///
/// Filled while the container is being built and frozen afterwards.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    bindings: HashMap<Key, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding, applying the binding's [DuplicatePolicy] if the key is taken
    pub fn register(&mut self, binding: Binding) -> Result<(), RegistryError> {
        let key = binding.key();
        match self.bindings.entry(key) {
            Entry::Vacant(entry) => {
                tracing::debug!("Registered binding for {key}");
                entry.insert(binding);
            }
            Entry::Occupied(mut entry) => match binding.duplicate_policy() {
                DuplicatePolicy::Fail => return Err(RegistryError::DuplicateBinding(key)),
                DuplicatePolicy::Override => {
                    tracing::debug!("Overriding binding for {key}");
                    entry.insert(binding);
                }
                DuplicatePolicy::Ignore => {
                    tracing::warn!("Ignoring duplicate binding for {key}");
                }
            },
        }

        Ok(())
    }

    /// Returns the binding registered in this registry only
    pub fn lookup(&self, key: &Key) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.bindings.keys()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
