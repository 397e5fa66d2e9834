use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    email: String,
    password: String,
) -> Result<Model, Error> {
    debug!("New User to be inserted: {email}");

    let now = Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        email: Set(email),
        password: Set(generate_hash(password)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::new(EntityApiErrorKind::RecordNotFound))
}

/// Looks the user up by email and checks `password` against the stored hash.
/// An unknown email and a wrong password fail the same way.
pub async fn verify_credentials(
    db: &impl ConnectionTrait,
    email: &str,
    password: &str,
) -> Result<Model, Error> {
    match find_by_email(db, email).await? {
        Some(user) => {
            verify_password(password, &user.password)?;
            Ok(user)
        }
        None => {
            debug!("Login attempt for unknown email {email}");
            Err(Error::new(EntityApiErrorKind::RecordUnauthenticated))
        }
    }
}

pub fn verify_password(password_to_verify: &str, password_hash: &str) -> Result<(), Error> {
    match password_auth::verify_password(password_to_verify, password_hash) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::new(EntityApiErrorKind::RecordUnauthenticated)),
    }
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn hash_verifies_only_against_the_original_password() {
        let hash = generate_hash("correct horse".to_owned());

        assert!(verify_password("correct horse", &hash).is_ok());
        assert_eq!(
            verify_password("battery staple", &hash).unwrap_err().error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(email: &str, password: &str) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            email: email.to_owned(),
            password: generate_hash(password.to_owned()),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_returns_the_inserted_user() -> Result<(), Error> {
        let stored = user("jo@example.com", "pw");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let created = create(&db, "jo@example.com".to_owned(), "pw".to_owned()).await?;

        assert_eq!(created.id, stored.id);
        assert_eq!(created.email, "jo@example.com");

        Ok(())
    }

    #[tokio::test]
    async fn verify_credentials_accepts_the_right_password() -> Result<(), Error> {
        let stored = user("jo@example.com", "pw");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![stored.clone()]])
            .into_connection();

        let verified = verify_credentials(&db, "jo@example.com", "pw").await?;

        assert_eq!(verified.id, stored.id);

        Ok(())
    }

    #[tokio::test]
    async fn verify_credentials_rejects_a_wrong_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user("jo@example.com", "pw")]])
            .into_connection();

        let result = verify_credentials(&db, "jo@example.com", "nope").await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }

    #[tokio::test]
    async fn verify_credentials_rejects_an_unknown_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let result = verify_credentials(&db, "nobody@example.com", "pw").await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }

    #[tokio::test]
    async fn find_by_id_reports_missing_users_as_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let result = find_by_id(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }
}
