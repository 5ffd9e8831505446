use std::{
    fmt::Debug,
    sync::{Arc, OnceLock, Weak},
};

use crate::{
    container::{DiContainer, DiContainerInner, DiHandle},
    errors::RequireError,
    resolver::Resolver,
    types::{DependencyInfo, Injectable, Key},
};

/// Lazily resolved dependency
///
/// Resolution is deferred until the first [Lazy::get], which lets two bindings depend
/// on each other as long as one side of the cycle is lazy.
///
/// Holds a weak reference to the container it was resolved from, so a `Lazy` stored inside
/// a scoped instance does not keep its container alive.
///
/// Accessing the value from inside the provider of the binding it points back to
/// fails with [RequireError::CyclicResolution].
pub struct Lazy<T: Injectable>(Arc<LazyInner<T>>);
struct LazyInner<T: Injectable> {
    key: Key,
    container: Weak<DiContainerInner>,
    once: OnceLock<Arc<T>>,
}
impl<T: Injectable> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Lazy(self.0.clone())
    }
}
impl<T: Injectable + Debug> Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.once.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => f.debug_tuple("Lazy").field(&"<unresolved>").finish(),
        }
    }
}
impl<T: Injectable> Resolver for Lazy<T> {
    fn resolve(handle: &DiHandle<'_>) -> Result<Self, RequireError> {
        Ok(Lazy(Arc::new(LazyInner {
            key: Key::of::<T>(),
            container: handle.container().downgrade(),
            once: OnceLock::new(),
        })))
    }

    fn dependency_info() -> DependencyInfo {
        DependencyInfo::lazy(Key::of::<T>())
    }
}
impl<T: Injectable> Lazy<T> {
    /// Accesses the Lazy Dependency, resolving it on first access
    pub fn get(&self) -> Result<&Arc<T>, RequireError> {
        if let Some(resolved) = self.0.once.get() {
            return Ok(resolved);
        }

        let container = self
            .0
            .container
            .upgrade()
            .map(DiContainer)
            .ok_or(RequireError::ContainerDropped(self.0.key))?;
        let resolved = container.require::<T>()?;

        // A racing access resolved the same scoped value, either one is fine to keep
        Ok(self.0.once.get_or_init(|| resolved))
    }

    /// True once the dependency was resolved
    pub fn is_resolved(&self) -> bool {
        self.0.once.get().is_some()
    }
}
