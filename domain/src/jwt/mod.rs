//! Issuing and verifying the HS256 access tokens that gate the `/api/v1` routes.
//!
//! The module also re-exports the `Jwt` struct from the `entity` module for convenience.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain::jwt::{generate_access_token, validate_access_token};
//! use service::config::Config;
//! use entity::Id;
//!
//! fn example(config: &Config, user_id: Id) {
//!     let jwt = generate_access_token(config, user_id).expect("signing secret configured");
//!     let claims = validate_access_token(config, &jwt.token).expect("fresh token");
//!     assert_eq!(claims.user_id, user_id);
//! }
//! ```

use crate::error::Error;
use chrono::Utc;
use entity::Id;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use service::config::Config;

// re-export the Jwt struct from the entity module
pub use entity::jwt::Jwt;

pub use claims::AccessTokenClaims;

pub(crate) mod claims;

fn signing_secret(config: &Config) -> Result<String, Error> {
    config.jwt_secret().ok_or_else(|| {
        warn!("Failed to get the JWT signing secret from config");
        Error::config()
    })
}

/// Issues an access token for `user_id` that expires `jwt_expiry_seconds` from now.
pub fn generate_access_token(config: &Config, user_id: Id) -> Result<Jwt, Error> {
    let secret = signing_secret(config)?;

    let claims = AccessTokenClaims {
        user_id,
        exp: Utc::now().timestamp().max(0) as u64 + config.jwt_expiry_seconds,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(Jwt {
        token,
        sub: user_id.to_string(),
    })
}

/// Verifies the signature and expiry of `token` and returns its claims.
pub fn validate_access_token(config: &Config, token: &str) -> Result<AccessTokenClaims, Error> {
    let secret = signing_secret(config)?;

    let data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(data.claims)
}
