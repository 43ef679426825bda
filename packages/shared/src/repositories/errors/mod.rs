pub mod callback_repository_errors;
pub mod studio_repository_errors;
