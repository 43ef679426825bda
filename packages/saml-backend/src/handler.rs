use lambda_runtime::Error;
use serde_json::Value;
use shared::models::http::{ProxyRequest, ProxyResponse};
use shared::services::errors::federation_service_errors::FederationServiceError;
use shared::services::federation_service::FederationService;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct SamlBackendHandler {
    federation_service: FederationService,
}

impl SamlBackendHandler {
    pub fn new(federation_service: FederationService) -> Self {
        Self { federation_service }
    }

    pub async fn handle_request(&self, request: ProxyRequest) -> Result<ProxyResponse, Error> {
        info!("Received SAML exchange request");

        let response = match self.federation_service.exchange(&request).await {
            Ok(url) => ProxyResponse::redirect(&url),
            Err(e) => error_response(e),
        };

        info!("Responding with status {}", response.status_code);
        Ok(response)
    }
}

fn error_response(err: FederationServiceError) -> ProxyResponse {
    match err {
        FederationServiceError::ControlPlane { status, message } => {
            error!("SageMaker rejected the request with {}: {}", status, message);
            ProxyResponse::with_body(status, message)
        }
        FederationServiceError::NotImplemented => {
            warn!("SAML exchange is disabled");
            ProxyResponse::with_body(501, Value::String(err.to_string()).to_string())
        }
        other => {
            error!("SAML exchange failed: {}", other);
            ProxyResponse::with_body(400, Value::String(other.to_string()).to_string())
        }
    }
}
