use serde::Serialize;
use utoipa::ToSchema;

/// An access token handed out by `POST /login`.
/// Not backed by a table.
///
/// - `token`: the encoded, signed JWT to send back in the `Authorization` header.
/// - `sub`: the id of the user the token was issued for, so clients don't
///   have to decode the token to learn it.
#[derive(Serialize, Debug, ToSchema)]
#[schema(as = jwt::Jwt)] // OpenAPI schema
pub struct Jwt {
    pub token: String,
    pub sub: String,
}
