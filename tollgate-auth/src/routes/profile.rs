use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use tollgate_shared::{ApiResponse, AppResult};

use super::current_user::CurrentUser;
use crate::models::Profile;
use crate::AppState;

pub async fn get_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = state.tokens.get_profile(user.user_id).await?;
    Ok(Json(ApiResponse::ok_with_message(profile, "User profile retrieved successfully")))
}

pub async fn delete_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<StatusCode> {
    state.tokens.delete_user(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
