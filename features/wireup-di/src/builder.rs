use std::borrow::Cow;

use crate::{
    binding::Binding,
    container::{DiContainer, DiHandle},
    dependency_graph::DependencyGraph,
    errors::{InitError, RegistryError},
    factories::InstanceFactory,
    initiator::DiInitiator,
    registry::Registry,
    types::{DynError, Injectable},
};

/// Collects the bindings and parents of a container, then links it.
///
/// Registration errors are kept until [DiBuilder::build] so calls can be chained;
/// use [DiBuilder::try_add_binding] to see them immediately.
pub struct DiBuilder {
    label: Cow<'static, str>,
    registry: Registry,
    parents: Vec<DiContainer>,
    errors: Vec<RegistryError>,
}
impl Default for DiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiBuilder {
    pub fn new() -> Self {
        DiBuilder {
            label: Cow::Borrowed("container"),
            registry: Registry::new(),
            parents: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Names the container in logs and conflict reports
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Adds a parent whose bindings are visible from the built container.
    ///
    /// Own bindings shadow inherited ones. Parents are siblings of each other,
    /// a key bound by more than one of them must be settled through [DuplicatePolicy](crate::DuplicatePolicy).
    pub fn with_parent(mut self, parent: DiContainer) -> Self {
        self.parents.push(parent);
        self
    }
}
impl DiBuilder {
    pub fn add_instance<T: Injectable>(self, instance: T) -> Self {
        self.add_binding(Binding::instance(instance))
    }

    pub fn add_instance_named<T: Injectable>(self, qualifier: &'static str, instance: T) -> Self {
        self.add_binding(Binding::instance(instance).named(qualifier))
    }

    pub fn add_factory<Factory: InstanceFactory + 'static>(self, factory: Factory) -> Self {
        self.add_binding(Binding::factory(factory))
    }

    /// Adds an unscoped provider without declared dependencies
    pub fn add_provider<T, E, F>(self, provider: F) -> Self
    where
        T: Injectable,
        E: Into<DynError>,
        F: Fn(&DiHandle<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        self.add_binding(Binding::provider(provider))
    }

    /// Adds a provider whose value is memoized for the container's lifetime
    pub fn add_scoped_provider<T, E, F>(self, provider: F) -> Self
    where
        T: Injectable,
        E: Into<DynError>,
        F: Fn(&DiHandle<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        self.add_binding(Binding::provider(provider).scoped())
    }

    pub fn add_binding(mut self, binding: Binding) -> Self {
        if let Err(e) = self.registry.register(binding) {
            self.errors.push(e);
        }
        self
    }

    pub fn try_add_binding(&mut self, binding: Binding) -> Result<&mut Self, RegistryError> {
        self.registry.register(binding)?;
        Ok(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Links the registry against the parents and freezes it into a container
    pub fn build(self) -> Result<DiContainer, InitError> {
        let DiBuilder {
            label,
            registry,
            parents,
            errors,
        } = self;

        if let Some(error) = errors.into_iter().next() {
            return Err(error.into());
        }

        tracing::debug!(
            "Linking '{label}' with {} bindings and {} parents",
            registry.len(),
            parents.len()
        );

        let graph = DependencyGraph::link(&registry, &parents)?;
        Ok(DiContainer::new(label, registry, parents, graph))
    }

    /// Builds the container and constructs every scoped binding right away
    pub fn build_eager(self) -> Result<DiContainer, InitError> {
        let container = self.build()?;
        DiInitiator::new(&container).initiate()?;
        Ok(container)
    }
}
