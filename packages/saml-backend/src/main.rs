use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;

mod handler;
use handler::SamlBackendHandler;
use shared::{
    config::Settings,
    models::http::ProxyRequest,
    repositories::studio_repository::SageMakerStudioRepository,
    services::{federation_service::FederationService, polling::PollPolicy},
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::load_from_env().await;
    let client = aws_sdk_sagemaker::Client::new(&config);

    let studio_repository = Arc::new(SageMakerStudioRepository::new(client));
    let federation_service = FederationService::new(
        studio_repository,
        Arc::new(settings.federation),
        PollPolicy::provisioning(),
    );

    let handler = SamlBackendHandler::new(federation_service);

    run(service_fn(move |event: LambdaEvent<ProxyRequest>| {
        let handler = handler.clone();
        async move { handler.handle_request(event.payload).await }
    }))
    .await
}
