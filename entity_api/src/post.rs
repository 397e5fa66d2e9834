use super::error::{EntityApiErrorKind, Error};
use entity::posts::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*,
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ConnectionTrait, QueryOrder, QuerySelect,
};

use log::*;

pub async fn create(
    db: &impl ConnectionTrait,
    user_id: Id,
    post_content: String,
) -> Result<Model, Error> {
    debug!("New Post to be inserted for user {user_id}");

    let now = chrono::Utc::now();

    let post_active_model: ActiveModel = ActiveModel {
        post_content: Set(post_content),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(post_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        debug!("Post with id {id} not found");
        Error::new(EntityApiErrorKind::RecordNotFound)
    })
}

/// Returns page `page` (0-based) of `page_size` posts, newest first.
pub async fn find_page(
    db: &impl ConnectionTrait,
    page: u64,
    page_size: u64,
) -> Result<Vec<Model>, Error> {
    let offset = page
        .checked_mul(page_size)
        .ok_or_else(|| Error::new(EntityApiErrorKind::InvalidQueryTerm))?;

    Ok(Entity::find()
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .offset(offset)
        .limit(page_size)
        .all(db)
        .await?)
}

/// Replaces the content of a post owned by `user_id`. A post that exists
/// but belongs to someone else is reported as not found.
pub async fn update(
    db: &impl ConnectionTrait,
    id: Id,
    user_id: Id,
    post_content: String,
) -> Result<Model, Error> {
    let existing = Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?;

    match existing {
        Some(post) => {
            debug!("Existing Post model to be Updated: {}", post.id);

            let active_model = ActiveModel {
                id: Unchanged(post.id),
                post_content: Set(post_content),
                user_id: Unchanged(post.user_id),
                created_at: Unchanged(post.created_at),
                updated_at: Set(chrono::Utc::now().into()),
            };

            Ok(active_model.update(db).await?)
        }
        None => {
            debug!("Post with id {id} not found for user {user_id}");
            Err(Error::new(EntityApiErrorKind::RecordNotFound))
        }
    }
}

/// Deletes a post owned by `user_id`.
pub async fn delete(db: &impl ConnectionTrait, id: Id, user_id: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!("Post with id {id} not found for user {user_id}, nothing deleted");
        return Err(Error::new(EntityApiErrorKind::RecordNotFound));
    }

    Ok(())
}
