use wireup_di::TypeInfo;

/// Errors when registering or retrieving configs
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The Config type is already registered
    #[error("A config of type '{0}' is already registered")]
    ConfigAlreadyRegistered(TypeInfo),
    /// The stored config could not be downcast to the requested type
    #[error("The config stored for '{0}' has a different type")]
    ConfigMismatch(TypeInfo),
}
