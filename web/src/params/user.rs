use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /signup` and `POST /login`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
