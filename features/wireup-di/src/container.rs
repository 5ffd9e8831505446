use std::{
    any::type_name,
    borrow::Cow,
    cell::RefCell,
    fmt::Debug,
    sync::{Arc, Weak},
};

use crate::{
    binding::Binding,
    builder::DiBuilder,
    dependency_graph::{DependencyGraph, Origin},
    errors::RequireError,
    registry::Registry,
    resolver::Resolver,
    scoped_cache::ScopedCache,
    types::{Injectable, Instance, Key},
};

/// Linked container, resolving keys through its own registry and its parents
///
/// Cheap to clone, all clones share the same scoped instances.
#[derive(Clone)]
pub struct DiContainer(pub(crate) Arc<DiContainerInner>);
pub struct DiContainerInner {
    label: Cow<'static, str>,
    registry: Registry,
    parents: Vec<DiContainer>,
    graph: DependencyGraph,
    cache: ScopedCache,
}
impl Debug for DiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<Key> = self.0.graph.visible_keys().collect();
        keys.sort_by_cached_key(Key::to_string);

        let mut map = f.debug_struct("DiContainer");
        map.field("label", &self.0.label);
        for key in keys {
            let val = match self.0.graph.origin(&key) {
                Some(Origin::Parent(_)) => "inherited",
                _ if self.0.cache.is_ready(&key) => "ready",
                _ if self.0.graph.is_scoped(&key) => "scoped",
                _ => "transient",
            };
            map.field(&key.to_string(), &val);
        }
        map.finish()
    }
}

impl DiContainer {
    pub(crate) fn new(
        label: Cow<'static, str>,
        registry: Registry,
        parents: Vec<DiContainer>,
        graph: DependencyGraph,
    ) -> Self {
        let cache = ScopedCache::for_registry(&registry);
        Self(Arc::new(DiContainerInner {
            label,
            registry,
            parents,
            graph,
            cache,
        }))
    }

    /// Attempts to get the requested type
    pub fn require<T: Injectable>(&self) -> Result<Arc<T>, RequireError> {
        downcast(self.require_key(&Key::of::<T>())?)
    }

    /// Attempts to get the requested type bound under a qualifier
    pub fn require_named<T: Injectable>(&self, qualifier: &'static str) -> Result<Arc<T>, RequireError> {
        downcast(self.require_key(&Key::named::<T>(qualifier))?)
    }

    /// Resolves anything implementing [Resolver], e.g. `Option<Arc<T>>`
    pub fn resolve<R: Resolver>(&self) -> Result<R, RequireError> {
        let handle = DiHandle {
            container: self,
            requester: None,
        };
        R::resolve(&handle)
    }

    /// Resolves the type erased value of a key
    ///
    /// Keys bound by a parent are resolved by that parent.
    pub fn require_key(&self, key: &Key) -> Result<Instance, RequireError> {
        match self.0.graph.origin(key) {
            Some(Origin::Local) => self.produce_local(key),
            Some(Origin::Parent(index)) => match self.0.parents.get(index) {
                Some(parent) => parent.require_key(key),
                None => Err(RequireError::MissingBinding(*key)),
            },
            None => {
                tracing::error!("Tried to require an unbound key: {key}");
                Err(RequireError::MissingBinding(*key))
            }
        }
    }

    fn produce_local(&self, key: &Key) -> Result<Instance, RequireError> {
        let binding = self
            .0
            .registry
            .lookup(key)
            .ok_or(RequireError::MissingBinding(*key))?;

        let _resolving = ResolvingGuard::enter(self, *key)?;
        let handle = DiHandle {
            container: self,
            requester: Some(*key),
        };

        self.0.cache.get_or_produce(key, || {
            tracing::debug!("Constructing {key} in '{}'", self.0.label);
            binding.produce(&handle)
        })
    }

    /// Returns the effective binding of a key, searching parents if it is not bound here
    pub fn lookup(&self, key: &Key) -> Option<&Binding> {
        self.owner_of(key).map(|(_, binding)| binding)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.0.graph.origin(key).is_some()
    }

    /// Returns the container owning the effective binding of a key
    pub(crate) fn owner_of(&self, key: &Key) -> Option<(&DiContainer, &Binding)> {
        match self.0.graph.origin(key)? {
            Origin::Local => self.0.registry.lookup(key).map(|binding| (self, binding)),
            Origin::Parent(index) => self.0.parents.get(index)?.owner_of(key),
        }
    }

    /// Starts building a container using this one as parent
    pub fn child(&self) -> DiBuilder {
        DiBuilder::new().with_parent(self.clone())
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.0.graph
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    pub fn parents(&self) -> &[DiContainer] {
        &self.0.parents
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Number of scoped values constructed so far in this container
    pub fn constructed_count(&self) -> usize {
        self.0.cache.ready_count()
    }

    pub fn ptr_eq(&self, other: &DiContainer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<DiContainerInner> {
        Arc::downgrade(&self.0)
    }
}

fn downcast<T: Injectable>(instance: Instance) -> Result<Arc<T>, RequireError> {
    instance
        .downcast()
        .map_err(|actual_type| RequireError::DowncastFailed {
            required_type: type_name::<T>(),
            actual_type,
        })
}

thread_local! {
    /// Keys being constructed on this thread, per container
    static RESOLVING: RefCell<Vec<(usize, Key)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as being constructed on the current thread
///
/// Requiring it again before the guard drops is a cycle the graph could not see,
/// through a lazy edge or an undeclared dependency.
struct ResolvingGuard {
    container: usize,
    key: Key,
}
impl ResolvingGuard {
    fn enter(container: &DiContainer, key: Key) -> Result<Self, RequireError> {
        let container = Arc::as_ptr(&container.0) as usize;
        RESOLVING.with_borrow_mut(|resolving| {
            if resolving.contains(&(container, key)) {
                return Err(RequireError::CyclicResolution(key));
            }
            resolving.push((container, key));
            Ok(ResolvingGuard { container, key })
        })
    }
}
impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with_borrow_mut(|resolving| {
            if let Some(position) = resolving
                .iter()
                .rposition(|entry| *entry == (self.container, self.key))
            {
                resolving.remove(position);
            }
        });
    }
}

/// DI Handle passed to providers for resolving their dependencies.
///
/// Resolves from the container owning the binding being constructed.
#[derive(Clone, Copy)]
pub struct DiHandle<'a> {
    container: &'a DiContainer,
    requester: Option<Key>,
}
impl<'a> DiHandle<'a> {
    pub fn resolve<T: Resolver>(&self) -> Result<T, RequireError> {
        T::resolve(self)
    }

    pub fn require<T: Injectable>(&self) -> Result<Arc<T>, RequireError> {
        self.container.require::<T>()
    }

    pub fn require_named<T: Injectable>(&self, qualifier: &'static str) -> Result<Arc<T>, RequireError> {
        self.container.require_named::<T>(qualifier)
    }

    pub fn require_key(&self, key: &Key) -> Result<Instance, RequireError> {
        self.container.require_key(key)
    }

    pub fn container(&self) -> &'a DiContainer {
        self.container
    }

    /// The key being constructed, None when resolving directly from a container
    pub fn requester(&self) -> Option<Key> {
        self.requester
    }
}
