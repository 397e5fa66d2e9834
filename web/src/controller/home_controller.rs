use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET the welcome message
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 202, description = "Welcome message")
    )
)]
pub async fn index() -> impl IntoResponse {
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Welcome to the Home Server",
            "status": StatusCode::OK.as_u16(),
        })),
    )
}
