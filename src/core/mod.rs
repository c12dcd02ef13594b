//! Core resolution types.

mod builder;
mod cache;
mod exports;
mod request;
mod resolver;
mod template;

pub use builder::ConfigResolverBuilder;
pub use cache::ParameterCache;
pub use exports::ExportResolver;
pub use request::{ConfigRequest, FlatValues, NormalizedRequest, Resolved};
pub use resolver::ConfigResolver;
pub use template::{ConfigTree, Leaves, Node, Template, Tree};
