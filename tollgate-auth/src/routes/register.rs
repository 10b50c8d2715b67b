use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use tollgate_shared::middleware::ValidatedJson;
use tollgate_shared::{ApiResponse, AppResult, TokenPair};

use super::CredentialsRequest;
use crate::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TokenPair>>)> {
    let pair = state.tokens.register(&req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(pair, "User registered successfully")),
    ))
}
