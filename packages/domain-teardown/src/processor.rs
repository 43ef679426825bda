use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use lambda_runtime::Error;
use shared::models::custom_resource::{
    CustomResourceRequest, CustomResourceResponse, RequestType, ResponseStatus,
};
use shared::repositories::callback_repository::CallbackRepository;
use shared::services::teardown_service::TeardownService;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Time kept back from the invocation deadline to deliver the callback.
const CALLBACK_MARGIN: Duration = Duration::from_secs(10);

/// Handles the lifecycle events of the domain teardown custom resource and
/// reports the outcome to CloudFormation exactly once.
#[derive(Clone)]
pub struct CustomResourceProcessor {
    teardown_service: TeardownService,
    callback_repository: Arc<dyn CallbackRepository + Send + Sync>,
}

impl CustomResourceProcessor {
    pub fn new(
        teardown_service: TeardownService,
        callback_repository: Arc<dyn CallbackRepository + Send + Sync>,
    ) -> Self {
        Self {
            teardown_service,
            callback_repository,
        }
    }

    pub async fn process_event(
        &self,
        request: CustomResourceRequest,
        log_stream_name: &str,
        invocation_deadline: SystemTime,
    ) -> Result<(), Error> {
        debug!("Received custom resource event: {:?}", request);
        info!(
            "Processing {:?} request {} for {}",
            request.request_type, request.request_id, request.logical_resource_id
        );

        let (physical_resource_id, outcome) = self
            .handle(&request, teardown_deadline(invocation_deadline))
            .await;

        let response = match outcome {
            Ok(()) => CustomResourceResponse::new(
                &request,
                ResponseStatus::Success,
                HashMap::new(),
                physical_resource_id,
                None,
                log_stream_name,
            ),
            Err(reason) => {
                error!("Custom resource request failed: {}", reason);
                CustomResourceResponse::new(
                    &request,
                    ResponseStatus::Failed,
                    HashMap::new(),
                    physical_resource_id,
                    Some(reason),
                    log_stream_name,
                )
            }
        };

        self.callback_repository
            .send_response(&request.response_url, &response)
            .await
            .map_err(|e| {
                error!("Failed to send response to CloudFormation: {}", e);
                Error::from(format!("Failed to send response to CloudFormation: {}", e))
            })
    }

    async fn handle(
        &self,
        request: &CustomResourceRequest,
        deadline: Instant,
    ) -> (Option<String>, Result<(), String>) {
        match request.request_type {
            RequestType::Create | RequestType::Update => {
                match request.resource_property("DomainId") {
                    Some(domain_id) => (Some(domain_id.to_string()), Ok(())),
                    None => (
                        request.physical_resource_id.clone(),
                        Err("ResourceProperties.DomainId is required".to_string()),
                    ),
                }
            }
            RequestType::Delete => match request.physical_resource_id.as_deref() {
                Some(domain_id) => {
                    let outcome = self
                        .teardown_service
                        .teardown(domain_id, Some(deadline))
                        .await
                        .map_err(|e| e.to_string());
                    (Some(domain_id.to_string()), outcome)
                }
                None => (
                    None,
                    Err("PhysicalResourceId is required to delete domain resources".to_string()),
                ),
            },
        }
    }
}

fn teardown_deadline(invocation_deadline: SystemTime) -> Instant {
    let remaining = invocation_deadline
        .duration_since(SystemTime::now())
        .unwrap_or(Duration::ZERO)
        .saturating_sub(CALLBACK_MARGIN);
    Instant::now() + remaining
}
