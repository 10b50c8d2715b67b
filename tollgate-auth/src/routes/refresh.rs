use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use tollgate_shared::middleware::ValidatedJson;
use tollgate_shared::{ApiResponse, AppResult, TokenPair};

use super::RefreshTokenRequest;
use crate::AppState;

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let pair = state.tokens.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok_with_message(pair, "Token refreshed successfully")))
}
