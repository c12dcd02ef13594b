//! AWS-backed collaborators: Systems Manager Parameter Store and CloudFormation exports.

mod cloudformation;
mod ssm;

pub use cloudformation::CloudFormationExports;
pub use ssm::SsmParameterStore;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, SdkConfig};

/// Region used when none is configured in the environment.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Load the shared AWS configuration, falling back to [`DEFAULT_REGION`].
pub async fn load_sdk_config() -> SdkConfig {
    let region = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
    aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .load()
        .await
}
