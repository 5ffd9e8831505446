use std::{ops::Deref, sync::Arc};

use wireup_di::{DependencyInfo, DiHandle, Key, RequireError, Resolver};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// This provides a simple way to retrieve configs from the config registry,
/// and inject them on a factory as a dependency
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wireup_config::{Config, ConfigProvider};
/// use wireup_di::{Binding, DiBuilder, Resolver};
///
/// struct MyModuleConfig {
///     enabled: bool,
/// }
/// struct MyModule {
///     enabled: bool,
/// }
///
/// let mut config_provider = ConfigProvider::new();
/// config_provider.add_config(MyModuleConfig { enabled: true }).unwrap();
///
/// let container = config_provider
///     .install(DiBuilder::new())
///     .add_binding(
///         Binding::provider(|di| {
///             let config: Config<MyModuleConfig> = di.resolve()?;
///             Ok::<_, wireup_di::RequireError>(MyModule { enabled: config.enabled })
///         })
///         .depends_on(Config::<MyModuleConfig>::dependency_info()),
///     )
///     .build()
///     .unwrap();
///
/// assert!(container.require::<MyModule>().unwrap().enabled);
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Send + Sync + 'static> Resolver for Config<T> {
    fn resolve(handle: &DiHandle<'_>) -> Result<Self, RequireError> {
        let config_provider = handle.require::<ConfigProvider>()?;

        let config: Arc<T> = config_provider
            .get_config()
            .map_err(|e| RequireError::ProviderFailed {
                key: Key::of::<T>(),
                error: Arc::new(Box::new(e)),
            })?
            .ok_or(RequireError::MissingBinding(Key::of::<T>()))?;

        Ok(Config { inner: config })
    }

    /// Configs are served by the installed [ConfigProvider], which is what the graph must contain
    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required(Key::of::<ConfigProvider>())
    }
}
