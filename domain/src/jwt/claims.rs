//! Claims carried by the access tokens this service issues.

use entity::Id;
use serde::{Deserialize, Serialize};

/// Claims of an access token issued at login.
///
/// - `user_id`: the authenticated user.
/// - `exp`: expiry as seconds since the Unix epoch; `jsonwebtoken` rejects
///   the token once it has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub user_id: Id,
    pub exp: u64,
}
