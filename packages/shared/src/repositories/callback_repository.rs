use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::models::custom_resource::CustomResourceResponse;
use crate::repositories::errors::callback_repository_errors::CallbackRepositoryError;

#[cfg(test)]
use mockall::automock;

/// Delivers custom resource results back to CloudFormation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CallbackRepository: Send + Sync {
    async fn send_response(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), CallbackRepositoryError>;
}

pub struct HttpCallbackRepository {
    client: reqwest::Client,
}

impl HttpCallbackRepository {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

pub fn encode_response(response: &CustomResourceResponse) -> Result<String, CallbackRepositoryError> {
    serde_json::to_string(response).map_err(|e| CallbackRepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl CallbackRepository for HttpCallbackRepository {
    async fn send_response(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), CallbackRepositoryError> {
        let body = encode_response(response)?;
        debug!("Response body: {}", body);

        // The response URL is pre-signed without a content type.
        let result = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|e| CallbackRepositoryError::Http(e.to_string()))?;

        let status = result.status();
        if !status.is_success() {
            let body = result.text().await.unwrap_or_default();
            return Err(CallbackRepositoryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Callback delivered with status code: {}", status.as_u16());
        Ok(())
    }
}
