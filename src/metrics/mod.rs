//! Built-in metrics for resolution operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Cache hits and misses
//! - Remote batch calls
//! - Resolution duration and failures
//!
//! # Examples
//!
//! ```rust,no_run
//! use paramstore_config::prelude::*;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let resolver = ConfigResolver::builder()
//!     .with_environment("production")
//!     .with_metrics(global::meter("my-app"))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod resolver_metrics;

pub use resolver_metrics::ResolverMetrics;
