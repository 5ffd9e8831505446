use std::{
    any::{Any, TypeId},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Error type returned by providers
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Containers are shared between threads,
/// so anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type erased value produced by a binding
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<ExistingInstance: Injectable>(instance: Arc<ExistingInstance>) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance,
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// True if both handles point at the same allocation
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

/// Type Name and Type Id
///
/// Only the [TypeId] takes part in equality and hashing, the name is for display.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}
impl Eq for TypeInfo {}
impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Identity of a binding: the provided type plus an optional qualifier
///
/// Two keys are the same binding iff both type and qualifier match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub type_info: TypeInfo,
    pub qualifier: Option<&'static str>,
}
impl Key {
    pub fn of<T: 'static + ?Sized>() -> Key {
        Key {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    pub fn named<T: 'static + ?Sized>(qualifier: &'static str) -> Key {
        Key {
            type_info: TypeInfo::of::<T>(),
            qualifier: Some(qualifier),
        }
    }
}
impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.qualifier {
            Some(qualifier) => write!(f, "{}@{}", self.type_info, qualifier),
            None => write!(f, "{}", self.type_info),
        }
    }
}

/// Information about a binding dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyInfo {
    /// The required Key
    pub key: Key,
    /// If it is optional or required
    pub optional: bool,
    /// If the Dependency is resolved lazily - lazy edges do not form cycles
    pub lazy: bool,
}
impl DependencyInfo {
    pub fn required(key: Key) -> Self {
        DependencyInfo {
            key,
            optional: false,
            lazy: false,
        }
    }

    pub fn optional(key: Key) -> Self {
        DependencyInfo {
            optional: true,
            ..Self::required(key)
        }
    }

    pub fn lazy(key: Key) -> Self {
        DependencyInfo {
            lazy: true,
            ..Self::required(key)
        }
    }
}
