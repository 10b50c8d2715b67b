pub mod errors;
pub mod middleware;
pub mod shutdown;
pub mod token;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use token::{TokenError, TokenKeys, TokenPayload, TokenSecret, TokenSubject};
pub use types::*;
