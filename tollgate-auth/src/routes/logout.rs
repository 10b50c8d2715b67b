use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

use tollgate_shared::middleware::ValidatedJson;
use tollgate_shared::AppResult;

use super::RefreshTokenRequest;
use crate::AppState;

pub async fn logout(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<StatusCode> {
    state.tokens.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
