use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /api/v1/posts` and `PUT /api/v1/posts/:id`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpsertParams {
    pub(crate) post_content: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// 0-based page number, newest posts first
    pub(crate) page: Option<u64>,
}

impl IndexParams {
    pub(crate) fn page(&self) -> u64 {
        self.page.unwrap_or(0)
    }
}
