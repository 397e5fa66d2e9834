use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::user::Credentials;
use crate::response::user::SignUpResponse;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::user as UserApi;

use log::*;

/// POST sign up a new user
#[utoipa::path(
    post,
    path = "/signup",
    request_body = crate::params::user::Credentials,
    responses(
        (status = 201, description = "Successfully signed up", body = crate::response::user::SignUpResponse),
        (status = 422, description = "Malformed email, empty password or email already taken"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn sign_up(
    State(app_state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Sign up user {}", creds.email);

    let user = UserApi::sign_up(app_state.db_conn_ref(), creds.email, creds.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED.into(),
            SignUpResponse::from(user),
        )),
    ))
}

/// GET the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "The user the access token belongs to", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User no longer exists"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    AuthenticatedUser(user_id): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Me for user {user_id}");

    let user = UserApi::find_by_id(app_state.db_conn_ref(), user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}
