//! Collaborators that supply parameter values.

mod local;
mod memory;
mod parameter_store;

#[cfg(feature = "aws")]
pub mod aws;

pub use local::{DEFAULT_LOCAL_PORT, LocalSource, LocalSourceBuilder};
pub use memory::{InMemoryExportsRegistry, InMemoryParameterStore, StoreCall};
pub use parameter_store::{
    ExportsPage, ExportsRegistry, Parameter, ParameterStore, ParametersPage, PathQuery,
};

#[cfg(feature = "aws")]
pub use aws::{CloudFormationExports, SsmParameterStore};
