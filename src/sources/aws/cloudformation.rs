//! Exports registry backed by AWS CloudFormation.

use crate::error::{ConfigError, Result};
use crate::sources::{ExportsPage, ExportsRegistry, Parameter};
use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::DisplayErrorContext;

/// [`ExportsRegistry`] implementation over the CloudFormation `ListExports` API.
#[derive(Clone)]
pub struct CloudFormationExports {
    client: Client,
}

impl CloudFormationExports {
    /// Wrap an existing CloudFormation client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let config = super::load_sdk_config().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ExportsRegistry for CloudFormationExports {
    async fn list_exports(&self, next_token: Option<&str>) -> Result<ExportsPage> {
        let output = self
            .client
            .list_exports()
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| ConfigError::RemoteFailure(DisplayErrorContext(&e).to_string()))?;

        let exports = output
            .exports()
            .iter()
            .filter_map(|export| {
                Some(Parameter::new(export.name()?, export.value().unwrap_or_default()))
            })
            .collect();

        Ok(ExportsPage {
            exports,
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn name(&self) -> String {
        "aws-cloudformation".to_string()
    }
}
