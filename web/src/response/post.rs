use domain::posts::Model;
use domain::Id;
use serde::Serialize;
use utoipa::ToSchema;

/// What `POST /api/v1/posts` returns about the created post.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostResponse {
    #[schema(value_type = uuid::Uuid)]
    pub(crate) id: Id,
    pub(crate) post_content: String,
}

impl From<Model> for PostResponse {
    fn from(post: Model) -> Self {
        Self {
            id: post.id,
            post_content: post.post_content,
        }
    }
}
