use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use tollgate_shared::middleware::ValidatedJson;
use tollgate_shared::{ApiResponse, AppResult, TokenPair};

use super::CredentialsRequest;
use crate::AppState;

pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let pair = state.tokens.login(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok_with_message(pair, "User logged in successfully")))
}
