use std::{fmt::Debug, sync::Arc};

use crate::{
    container::DiHandle,
    errors::RequireError,
    factories::DynFactory,
    types::{DependencyInfo, DynError, Injectable, Instance, Key},
};

/// Type erased provider function of a binding
pub type Provider = Arc<dyn Fn(&DiHandle<'_>) -> Result<Instance, DynError> + Send + Sync>;

/// What happens when a Key is registered while a binding for it already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicatePolicy {
    /// Registration fails with [RegistryError::DuplicateBinding](crate::errors::RegistryError)
    #[default]
    Fail,
    /// The new binding replaces the existing one.
    /// Between sibling parents, an overriding binding wins over the others.
    Override,
    /// The new binding is dropped and the existing one is kept.
    /// Between sibling parents, an ignoring binding yields to the others.
    Ignore,
}

#[derive(Clone)]
enum BindingSource {
    Provider(Provider),
    Instance(Instance),
}

/// A registered way to obtain a value for a [Key]
#[derive(Clone)]
pub struct Binding {
    key: Key,
    source: BindingSource,
    dependencies: Vec<DependencyInfo>,
    policy: DuplicatePolicy,
    scoped: bool,
}
impl Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match self.source {
            BindingSource::Provider(_) => "provider",
            BindingSource::Instance(_) => "instance",
        };
        f.debug_struct("Binding")
            .field("key", &self.key.to_string())
            .field("source", &source)
            .field("dependencies", &self.dependencies.len())
            .field("policy", &self.policy)
            .field("scoped", &self.scoped)
            .finish()
    }
}

impl Binding {
    /// Binds an already constructed value, it is shared by every resolution
    pub fn instance<T: Injectable>(instance: T) -> Self {
        Binding {
            key: Key::of::<T>(),
            source: BindingSource::Instance(Instance::new(instance)),
            dependencies: Vec::new(),
            policy: DuplicatePolicy::default(),
            scoped: true,
        }
    }

    /// Binds a provider function.
    ///
    /// The provider is called on every resolution unless the binding is made [scoped](Self::scoped).
    /// Dependencies the provider requires should be declared with [depends_on](Self::depends_on)
    /// so the graph can be checked before anything is constructed.
    pub fn provider<T, E, F>(provider: F) -> Self
    where
        T: Injectable,
        E: Into<DynError>,
        F: Fn(&DiHandle<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        let provider: Provider = Arc::new(move |di: &DiHandle<'_>| -> Result<Instance, DynError> {
            provider(di).map(Instance::new).map_err(Into::into)
        });

        Binding {
            key: Key::of::<T>(),
            source: BindingSource::Provider(provider),
            dependencies: Vec::new(),
            policy: DuplicatePolicy::default(),
            scoped: false,
        }
    }

    /// Binds a typed factory, taking over its key, dependencies and scoping
    pub fn factory<Factory: DynFactory + 'static>(factory: Factory) -> Self {
        let key = factory.supplies();
        let dependencies = factory.dependencies();
        let scoped = factory.is_scoped();

        let factory = Arc::new(factory);
        let provider: Provider = Arc::new(move |di: &DiHandle<'_>| factory.construct(di));

        Binding {
            key,
            source: BindingSource::Provider(provider),
            dependencies,
            policy: DuplicatePolicy::default(),
            scoped,
        }
    }

    /// Qualifies the key of this binding
    pub fn named(mut self, qualifier: &'static str) -> Self {
        self.key.qualifier = Some(qualifier);
        self
    }

    /// Memoize the provided value for the lifetime of the container
    pub fn scoped(mut self) -> Self {
        self.scoped = true;
        self
    }

    pub fn depends_on(mut self, dependency: DependencyInfo) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = DependencyInfo>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for [DuplicatePolicy::Override]
    pub fn overriding(self) -> Self {
        self.policy(DuplicatePolicy::Override)
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn dependencies(&self) -> &[DependencyInfo] {
        &self.dependencies
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// True for bindings wrapping a prebuilt instance
    pub fn is_instance(&self) -> bool {
        matches!(self.source, BindingSource::Instance(_))
    }

    /// Produces a value, calling the provider if there is one
    pub(crate) fn produce(&self, di: &DiHandle<'_>) -> Result<Instance, RequireError> {
        match &self.source {
            BindingSource::Instance(instance) => Ok(instance.clone()),
            BindingSource::Provider(provider) => {
                provider(di).map_err(|error| RequireError::provider_failed(self.key, error))
            }
        }
    }
}
