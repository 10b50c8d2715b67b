use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use tollgate_shared::middleware::BearerToken;
use tollgate_shared::{ApiResponse, AppResult, TokenPayload};

use crate::AppState;

pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<ApiResponse<TokenPayload>>> {
    let payload = state.tokens.validate_token(&token).await?;
    Ok(Json(ApiResponse::ok_with_message(payload, "Token is valid")))
}
