pub(crate) mod authenticated_user;
pub(crate) mod origin_connection;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
