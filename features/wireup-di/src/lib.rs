//! Programmatic dependency injection with a linked binding graph.
//!
//! The DI consists of three parts:
//! 1. The [DiBuilder] where one registers bindings: instances, providers and factories, keyed by type and qualifier
//! 2. Linking, where the graph is checked for duplicate, missing, conflicting and circular bindings
//! 3. The [DiContainer] resolving keys, memoizing scoped bindings and delegating inherited keys to its parents
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wireup_di::{Binding, DiBuilder, DynError, Resolver};
//!
//! struct Database {
//!     url: String,
//! }
//! struct Repository {
//!     db: Arc<Database>,
//! }
//!
//! let root = DiBuilder::new()
//!     .label("root")
//!     .add_instance(Database { url: "postgres://localhost".into() })
//!     .build()
//!     .unwrap();
//!
//! let request = root
//!     .child()
//!     .label("request")
//!     .add_binding(
//!         Binding::provider(|di| Ok::<_, DynError>(Repository { db: di.resolve()? }))
//!             .depends_on(Arc::<Database>::dependency_info())
//!             .scoped(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let repository = request.require::<Repository>().unwrap();
//! assert_eq!(repository.db.url, "postgres://localhost");
//! assert!(Arc::ptr_eq(&repository, &request.require::<Repository>().unwrap()));
//! ```

pub mod binding;
pub mod builder;
pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub(crate) mod initiator;
pub mod registry;
pub mod resolver;
pub(crate) mod scoped_cache;
pub mod types;

pub use binding::{Binding, DuplicatePolicy, Provider};
pub use builder::DiBuilder;
pub use container::{DiContainer, DiHandle};
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors, Origin};
pub use errors::{InitError, RegistryError, RequireError};
pub use factories::{DynFactory, InstanceFactory};
pub use registry::Registry;
pub use resolver::{
    lazy::Lazy,
    named::{Named, Qualifier},
    Resolver,
};
pub use types::{DependencyInfo, DynError, Injectable, Instance, Key, TypeInfo};
