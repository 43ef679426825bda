pub mod errors;
pub mod federation_service;
pub mod polling;
pub mod teardown_service;
