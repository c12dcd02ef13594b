//! Parameter store backed by AWS Systems Manager.

use crate::error::{ConfigError, Result};
use crate::sources::{Parameter, ParameterStore, ParametersPage, PathQuery};
use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::error::DisplayErrorContext;

/// [`ParameterStore`] implementation over the SSM `GetParameters` and
/// `GetParametersByPath` APIs.
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::sources::SsmParameterStore;
///
/// # async fn example() {
/// let store = SsmParameterStore::from_env().await;
/// # }
/// ```
#[derive(Clone)]
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    /// Wrap an existing SSM client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let config = super::load_sdk_config().await;
        Self::new(Client::new(&config))
    }
}

fn to_parameters(parameters: &[aws_sdk_ssm::types::Parameter]) -> Vec<Parameter> {
    parameters
        .iter()
        .filter_map(|p| Some(Parameter::new(p.name()?, p.value().unwrap_or_default())))
        .collect()
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameters(
        &self,
        names: &[String],
        with_decryption: bool,
    ) -> Result<ParametersPage> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(|e| ConfigError::RemoteFailure(DisplayErrorContext(&e).to_string()))?;

        Ok(ParametersPage {
            parameters: to_parameters(output.parameters()),
            invalid_parameters: output.invalid_parameters().to_vec(),
            next_token: None,
        })
    }

    async fn get_parameters_by_path(&self, query: &PathQuery) -> Result<ParametersPage> {
        let output = self
            .client
            .get_parameters_by_path()
            .path(&query.path)
            .recursive(query.recursive)
            .with_decryption(query.with_decryption)
            .set_next_token(query.next_token.clone())
            .send()
            .await
            .map_err(|e| ConfigError::RemoteFailure(DisplayErrorContext(&e).to_string()))?;

        Ok(ParametersPage {
            parameters: to_parameters(output.parameters()),
            invalid_parameters: Vec::new(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn name(&self) -> String {
        "aws-ssm".to_string()
    }
}
