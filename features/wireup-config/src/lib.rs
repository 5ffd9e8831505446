//! Wireup Config provides a registry of configs that can be injected in the rest of the
//! application.
//!
//! Wireup Config is split into two major parts:
//! 1. ConfigProvider: Used to create the registry of all configs and install it into a container
//! 2. Config<T>: A wrapper type to be able to resolve and retrieve configs
//!
//! # Examples
//!
//! ```rust
//! use wireup_config::{Config, ConfigProvider};
//! use wireup_di::DiBuilder;
//!
//! #[derive(Clone)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut config_provider = ConfigProvider::new();
//! config_provider
//!     .add_config(AppConfig {
//!         host: "localhost".to_string(),
//!         port: 8080,
//!     })
//!     .unwrap();
//!
//! let container = config_provider.install(DiBuilder::new()).build().unwrap();
//! let config: Config<AppConfig> = container.resolve().unwrap();
//!
//! assert_eq!(config.host, "localhost");
//! assert_eq!(config.port, 8080);
//! ```

pub mod config;
pub mod errors;
pub mod provider;

pub use config::Config;
pub use errors::ConfigError;
pub use provider::ConfigProvider;
