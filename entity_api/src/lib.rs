use chrono::Utc;
use log::*;
use password_auth::generate_hash;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};

pub use entity::{posts, users, Id};

pub mod error;
pub mod post;
pub mod user;

/// Inserts a couple of demo users and posts for local development.
/// Every seeded user has the password `password`.
pub async fn seed_database(db: &impl ConnectionTrait) -> Result<(), error::Error> {
    let now = Utc::now();

    let alice = users::ActiveModel {
        email: Set("alice@example.com".to_owned()),
        password: Set(generate_hash("password")),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let bob = users::ActiveModel {
        email: Set("bob@example.com".to_owned()),
        password: Set(generate_hash("password")),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (author, content) in [
        (alice.id, "Hello from Alice"),
        (bob.id, "Bob was here"),
        (alice.id, "Second post, still Alice"),
    ] {
        post::create(db, author, content.to_owned()).await?;
    }

    info!("Seeded users {} and {} with 3 posts", alice.email, bob.email);

    Ok(())
}
