use axum::Json;

use tollgate_shared::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("tollgate-auth", env!("CARGO_PKG_VERSION")))
}
