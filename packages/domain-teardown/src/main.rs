use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

mod processor;
use processor::CustomResourceProcessor;
use shared::{
    config::Settings,
    models::custom_resource::CustomResourceRequest,
    repositories::{
        callback_repository::HttpCallbackRepository, studio_repository::SageMakerStudioRepository,
    },
    services::teardown_service::TeardownService,
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
    let teardown_service = TeardownService::new(
        studio_repository,
        settings.teardown_policy,
        settings.teardown_budget,
    );

    let callback_repository = Arc::new(HttpCallbackRepository::new(reqwest::Client::new()));

    let processor = CustomResourceProcessor::new(teardown_service, callback_repository);

    run(service_fn(move |event: LambdaEvent<CustomResourceRequest>| {
        let processor = processor.clone();
        async move {
            let (request, context) = event.into_parts();
            let deadline = UNIX_EPOCH + Duration::from_millis(context.deadline);
            processor
                .process_event(request, &context.env_config.log_stream, deadline)
                .await
        }
    }))
    .await
}
