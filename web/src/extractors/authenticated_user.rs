use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::Id;

/// The user an access token was issued for. Inserted into the request
/// extensions by `middleware::auth::require_auth`, so it is only available on
/// routes behind that middleware.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AuthenticatedUser(pub Id);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))
    }
}
