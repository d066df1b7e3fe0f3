//! AWS Secrets Manager secret store.
//!
//! Reads the `SecretString` of the current version of a secret via
//! `GetSecretValue`. The secret id is the rendered path, e.g.
//! `mysql/prod/user-two`.
//!
//! For a list of exceptions thrown by the API, see
//! <https://docs.aws.amazon.com/secretsmanager/latest/apireference/API_GetSecretValue.html>

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;

use super::client::SecretStore;
use super::error::StoreError;

/// Region used when none is configured.
pub const DEFAULT_AWS_REGION: &str = "eu-west-2";

/// Settings for [`AwsSecretStore`].
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,

    /// Custom endpoint (LocalStack, VPC endpoints)
    pub endpoint_url: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self { region: DEFAULT_AWS_REGION.to_string(), endpoint_url: None }
    }
}

/// Read-only AWS Secrets Manager store.
pub struct AwsSecretStore {
    client: SecretsManagerClient,
}

impl AwsSecretStore {
    /// Loads the SDK configuration (credentials chain, region) and builds the client.
    pub async fn new(config: AwsConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        tracing::info!(
            region = %config.region,
            endpoint = ?config.endpoint_url,
            "AWS Secrets Manager secret store configured"
        );

        Self { client: SecretsManagerClient::new(&sdk_config) }
    }
}

fn classify(error: SdkError<GetSecretValueError>) -> StoreError {
    match &error {
        SdkError::ServiceError(service) => match service.err() {
            GetSecretValueError::ResourceNotFoundException(_) => StoreError::NotFound,
            GetSecretValueError::DecryptionFailure(e) => StoreError::access_denied(e.to_string()),
            GetSecretValueError::InternalServiceError(e) => StoreError::unavailable(e.to_string()),
            other => {
                let message = other.message().unwrap_or("unknown service error").to_string();
                match other.code() {
                    Some("AccessDeniedException") => StoreError::access_denied(message),
                    Some("ThrottlingException") => StoreError::throttled(message),
                    _ => StoreError::backend(message),
                }
            }
        },
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StoreError::unavailable(error.to_string())
        }
        _ => StoreError::backend(error.to_string()),
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get_secret(&self, path: &str) -> Result<String, StoreError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(path)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    path = %path,
                    "Failed to read secret from AWS Secrets Manager"
                );
                classify(e)
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::backend("secret has no SecretString (binary secrets are not supported)")
            })
    }

    fn backend_name(&self) -> &'static str {
        "aws"
    }
}
