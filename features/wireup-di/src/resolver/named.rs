use std::{marker::PhantomData, ops::Deref, sync::Arc};

use crate::{
    container::DiHandle,
    errors::RequireError,
    resolver::Resolver,
    types::{DependencyInfo, Injectable, Key},
};

/// Compile time name of a qualified binding
///
/// ```rust
/// use wireup_di::Qualifier;
///
/// struct Primary;
/// impl Qualifier for Primary {
///     const NAME: &'static str = "primary";
/// }
/// ```
pub trait Qualifier: Send + Sync + 'static {
    const NAME: &'static str;
}

/// A dependency bound under the qualifier `Q`
pub struct Named<T, Q: Qualifier> {
    inner: Arc<T>,
    _qualifier: PhantomData<Q>,
}
impl<T, Q: Qualifier> Deref for Named<T, Q> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T, Q: Qualifier> Named<T, Q> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Injectable, Q: Qualifier> Resolver for Named<T, Q> {
    fn resolve(handle: &DiHandle<'_>) -> Result<Self, RequireError> {
        Ok(Named {
            inner: handle.require_named::<T>(Q::NAME)?,
            _qualifier: PhantomData,
        })
    }

    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required(Key::named::<T>(Q::NAME))
    }
}
