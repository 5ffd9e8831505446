use std::sync::Arc;

use crate::{
    container::DiHandle,
    errors::RequireError,
    resolver::Resolver,
    types::{DependencyInfo, Injectable, Key},
};

impl<T: Injectable> Resolver for Arc<T> {
    fn resolve(handle: &DiHandle<'_>) -> Result<Self, RequireError> {
        handle.require::<T>()
    }

    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required(Key::of::<T>())
    }
}

impl<Resolvable: Resolver> Resolver for Option<Resolvable> {
    fn resolve(handle: &DiHandle<'_>) -> Result<Self, RequireError>
    where
        Self: Sized,
    {
        let own_key = Resolvable::dependency_info().key;
        match Resolvable::resolve(handle) {
            Ok(resolved) => Ok(Some(resolved)),
            // Only the absence of this key is fine, a missing transitive dependency is still an error
            Err(RequireError::MissingBinding(key)) if key == own_key => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn dependency_info() -> DependencyInfo {
        let original = Resolvable::dependency_info();
        DependencyInfo {
            optional: true,
            ..original
        }
    }
}
