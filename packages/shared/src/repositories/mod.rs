pub mod callback_repository;
pub mod errors;
pub mod studio_repository;
