pub mod password;
pub mod token_service;

pub use password::CredentialHasher;
pub use token_service::TokenService;
