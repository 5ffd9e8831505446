use crate::{
    container::DiHandle,
    types::{DependencyInfo, DynError, Injectable, Instance, Key},
};

/// A Factory providing instances of a given type
pub trait InstanceFactory: Send + Sync {
    type Provides: Injectable;

    /// Returns the key the factory's product is bound to
    fn supplies() -> Key {
        Key::of::<Self::Provides>()
    }

    /// Returns a list of dependencies the factory requires to supply it's type
    fn get_dependencies() -> Vec<DependencyInfo>;

    /// Whether the product is memoized per container, defaults to true
    fn is_scoped() -> bool {
        true
    }

    /// Constructs a new instance of the factory's provided type
    ///
    /// Returns the constructed instance, or an error if either Dependencies are not satisfied or the Instantiation failed
    fn construct(&self, di: &DiHandle<'_>) -> Result<Self::Provides, impl Into<DynError>>;
}

/// Wrapper Trait for factories, providing instances of Any
pub trait DynFactory: Send + Sync {
    fn supplies(&self) -> Key;

    /// Returns a list of dependencies for the factory
    fn dependencies(&self) -> Vec<DependencyInfo>;

    fn is_scoped(&self) -> bool;

    /// Constructs a new instance of the factory's provided type, fulfilling all its dependencies
    fn construct(&self, di: &DiHandle<'_>) -> Result<Instance, DynError>;
}
// Impl DynFactory for any InstanceFactory
impl<T: Injectable, SpecificFactory: InstanceFactory<Provides = T>> DynFactory for SpecificFactory {
    fn supplies(&self) -> Key {
        <SpecificFactory as InstanceFactory>::supplies()
    }

    fn dependencies(&self) -> Vec<DependencyInfo> {
        <SpecificFactory as InstanceFactory>::get_dependencies()
    }

    fn is_scoped(&self) -> bool {
        <SpecificFactory as InstanceFactory>::is_scoped()
    }

    fn construct(&self, di: &DiHandle<'_>) -> Result<Instance, DynError> {
        // Forward the call to the specific implementation
        <SpecificFactory as InstanceFactory>::construct(self, di)
            .map(Instance::new)
            .map_err(|e| e.into())
    }
}
