use crate::controller::ApiResponse;
use crate::params::user::Credentials;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::user as UserApi;
use log::*;

/// Logs the user in and returns a new access token.
///
/// After logging in successfully, pass the token back to the server for
/// every protected API call, e.g.:
/// curl --header "Authorization: Bearer <token>" http://localhost:4000/api/v1/me
#[utoipa::path(
    post,
    path = "/login",
    request_body = crate::params::user::Credentials,
    responses(
        (status = 200, description = "Logs in and returns an access token", body = domain::jwt::Jwt),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let jwt = UserApi::login(
        app_state.db_conn_ref(),
        &app_state.config,
        &creds.email,
        &creds.password,
    )
    .await
    .map_err(|e| {
        warn!("Authentication failed for {}: {e}", creds.email);
        e
    })?;

    info!("User {} logged in", jwt.sub);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), jwt)))
}
