use crate::error::{EntityErrorKind, Error};
use crate::jwt::{self, Jwt};
use crate::users::Model;
use email_address::EmailAddress;
use entity_api::user;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;

pub use entity_api::user::{find_by_email, find_by_id};

/// Registers a new user. The email must be well formed and not yet taken,
/// and the password must not be empty; otherwise the error is `Invalid`.
pub async fn sign_up(db: &DatabaseConnection, email: String, password: String) -> Result<Model, Error> {
    let email = email.trim().to_lowercase();

    if !EmailAddress::is_valid(&email) {
        debug!("Rejecting sign up with malformed email address");
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    if password.is_empty() {
        debug!("Rejecting sign up for {email} with an empty password");
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    let user = user::create(db, email, password).await?;
    info!("Signed up user {}", user.id);

    Ok(user)
}

/// Checks the credentials and issues an access token for the user.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<Jwt, Error> {
    let email = email.trim().to_lowercase();
    let user = user::verify_credentials(db, &email, password).await?;

    jwt::generate_access_token(config, user.id)
}
