pub mod auth_service;
pub mod directory;
pub mod token_service;
