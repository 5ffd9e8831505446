use std::sync::Arc;

use thiserror::Error;

use crate::{
    dependency_graph::DependencyGraphErrors,
    types::{DynError, Key},
};

/// Errors while registering bindings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A Key was registered twice without asking for an override
    #[error("A binding for '{0}' is already registered - use DuplicatePolicy::Override to replace it")]
    DuplicateBinding(Key),
}

/// Errors when trying to require a certain key
#[derive(Error, Debug, Clone)]
pub enum RequireError {
    /// No binding anywhere in the container chain
    #[error("No binding for '{0}' in this container or any parent")]
    MissingBinding(Key),

    /// The provider of the binding returned an error
    #[error("Provider for '{key}' failed - error: {error}")]
    ProviderFailed { key: Key, error: Arc<DynError> },

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },

    /// A provider required its own key while computing it, only possible through lazy edges.
    /// Also returned when threads would end up waiting on each other's constructions.
    #[error("'{0}' was required while it was being constructed by a resolution depending on it")]
    CyclicResolution(Key),

    /// A lazy dependency outlived the container it was resolved from
    #[error("The container providing '{0}' has been dropped")]
    ContainerDropped(Key),
}
impl RequireError {
    pub(crate) fn provider_failed(key: Key, error: DynError) -> Self {
        RequireError::ProviderFailed {
            key,
            error: Arc::new(error),
        }
    }
}

/// Errors while building a container
#[derive(Error, Debug, Clone)]
pub enum InitError {
    /// A binding could not be registered
    #[error(transparent)]
    RegistryError(#[from] RegistryError),

    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] DependencyGraphErrors),

    /// A provider failed while eagerly constructing scoped bindings
    #[error("Factory for '{product}' failed - error: {error}")]
    FactoryFailed { product: Key, error: Arc<DynError> },

    /// Resolution failed for another reason during eager construction
    #[error(transparent)]
    RequireError(RequireError),
}
impl From<RequireError> for InitError {
    fn from(error: RequireError) -> Self {
        match error {
            RequireError::ProviderFailed { key, error } => InitError::FactoryFailed {
                product: key,
                error,
            },
            other => InitError::RequireError(other),
        }
    }
}
