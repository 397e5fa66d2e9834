use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::error::{DomainErrorKind, InternalErrorKind};
use domain::jwt;
use log::*;

/// Authentication middleware that returns 401 Unauthorized unless the request
/// carries a valid access token in its `Authorization` header. The `Bearer `
/// prefix is optional.
///
/// On success the token's user is inserted into the request extensions for
/// the `AuthenticatedUser` extractor.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = access_token(request.headers()) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match jwt::validate_access_token(&app_state.config, &token) {
        Ok(claims) => {
            trace!("Authenticated request for user {}", claims.user_id);
            request
                .extensions_mut()
                .insert(AuthenticatedUser(claims.user_id));
            next.run(request).await
        }
        Err(e) if e.error_kind == DomainErrorKind::Internal(InternalErrorKind::Config) => {
            Error::from(e).into_response()
        }
        Err(e) => {
            debug!("Rejecting access token: {e}");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

fn access_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}
