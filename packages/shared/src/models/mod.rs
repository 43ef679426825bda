pub mod assertion;
pub mod custom_resource;
pub mod http;
pub mod metadata;
pub mod studio;
