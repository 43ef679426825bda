pub mod federation_service_errors;
pub mod teardown_service_errors;
