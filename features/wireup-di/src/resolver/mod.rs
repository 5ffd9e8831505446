use crate::{container::DiHandle, errors::RequireError, types::DependencyInfo};

pub mod arc;
pub mod lazy;
pub mod named;

/// Allows custom behaviour on injection
///
/// Implementors describe what they need through [Resolver::dependency_info],
/// which factories return from `get_dependencies` so the graph can be checked up front.
pub trait Resolver {
    fn resolve(handle: &DiHandle<'_>) -> Result<Self, RequireError>
    where
        Self: Sized;

    fn dependency_info() -> DependencyInfo;
}
