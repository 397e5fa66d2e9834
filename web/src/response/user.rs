use domain::users::Model;
use domain::Id;
use serde::Serialize;
use utoipa::ToSchema;

/// What `POST /signup` returns about the new user.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SignUpResponse {
    #[schema(value_type = uuid::Uuid)]
    pub(crate) id: Id,
    pub(crate) email: String,
}

impl From<Model> for SignUpResponse {
    fn from(user: Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}
