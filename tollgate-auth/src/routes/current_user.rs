use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tollgate_shared::middleware::extract_bearer_token;
use tollgate_shared::{AppError, AuthenticatedIdentity};

use crate::AppState;

/// The caller identified by a verified access token.
///
/// Missing or non-Bearer credentials reject with 401, a bad token with 403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedIdentity);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        state.tokens.authenticate(token).map(Self)
    }
}
