use crate::CONNECTION_ID_HEADER;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::Id;
use log::*;
use std::convert::Infallible;

/// The caller's own WebSocket connection, taken from the `x-connection-id`
/// header. Absent or unparsable values yield `None`; the request is never
/// rejected because of this header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OriginConnection(pub Option<Id>);

#[async_trait]
impl<S> FromRequestParts<S> for OriginConnection
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let connection_id = parts
            .headers
            .get(CONNECTION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| match Id::parse_str(value.trim()) {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!("Ignoring unparsable {CONNECTION_ID_HEADER} header: {value}");
                    None
                }
            });

        Ok(OriginConnection(connection_id))
    }
}
