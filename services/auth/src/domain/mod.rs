pub mod repository;
pub mod secret;
pub mod types;
