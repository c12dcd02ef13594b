//! # paramstore-config
//!
//! Resolve application configuration from a remote parameter store.
//!
//! ## Overview
//!
//! `paramstore-config` looks up configuration values stored under an
//! environment namespace (`/{environment}/{key}`) and combines:
//! - Three request shapes: a single key, a list of keys, or a nested template
//! - Chunked, concurrent batch fetches within the store's 10-name limit
//! - An additive, process-wide cache with lock-free reads
//! - Paginated retrieval of everything under a path prefix
//! - Template resolution against a registry of named exports
//! - A local development mode backed by a small HTTP server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paramstore_config::prelude::*;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     mysql: MysqlConfig,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct MysqlConfig {
//!     host: String,
//!     password: String,
//! }
//!
//! # async fn example() -> paramstore_config::error::Result<()> {
//! let resolver = ConfigResolver::builder()
//!     .with_env_overrides("PARAMSTORE")
//!     .build()
//!     .await?;
//!
//! // Leaves are parameter keys; the result has the same shape.
//! let template = Template::from_json(json!({
//!     "mysql": { "host": "mysql/host", "password": "mysql/password" }
//! }))?;
//!
//! let config: AppConfig = resolver.get_as(template).await?;
//! println!("MySQL host: {}", config.mysql.host);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `aws` (default): AWS Systems Manager and CloudFormation collaborators
//! - `dev-server`: the local development server and its binary
//! - `metrics`: OpenTelemetry resolution metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod fetch;
pub mod settings;
pub mod sources;

#[cfg(feature = "dev-server")]
pub mod devserver;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        ConfigRequest, ConfigResolver, ConfigResolverBuilder, ConfigTree, FlatValues,
        ParameterCache, Resolved, Template,
    };
    pub use crate::error::{ConfigError, Result};
    pub use crate::settings::ResolverSettings;
}
