use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, origin_connection::OriginConnection,
};
use crate::params::post::{IndexParams, UpsertParams};
use crate::response::post::PostResponse;
use crate::{AppState, Error};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::post as PostApi;
use domain::Id;
use serde_json::json;

use log::*;

/// POST create a new Post for the authenticated user. Connected WebSocket
/// clients are sent a `post_create` event once it is stored.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    params(
        ("x-connection-id" = Option<String>, Header, description = "The caller's WebSocket connection id, excluded from the broadcast")
    ),
    request_body = crate::params::post::UpsertParams,
    responses(
        (status = 201, description = "Successfully Created a New Post", body = crate::response::post::PostResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user_id): AuthenticatedUser,
    OriginConnection(origin): OriginConnection,
    State(app_state): State<AppState>,
    Json(params): Json<UpsertParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Post for user {user_id}");

    let post = PostApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user_id,
        params.post_content,
        origin,
    )
    .await?;

    debug!("New Post: {}", post.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StatusCode::CREATED.into(),
            PostResponse::from(post),
        )),
    ))
}

/// GET a particular Post specified by its id.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Post id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a specific Post by its id", body = domain::posts::Model),
        (status = 404, description = "Post not found"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Post by id: {id}");

    let post = PostApi::find_by_id(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), post)))
}

/// GET one page of Posts, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved a page of Posts", body = [domain::posts::Model]),
        (status = 400, description = "Bad Request"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    let page = params.page();
    debug!("GET Posts page {page}");

    let posts = PostApi::find_page(
        app_state.db_conn_ref(),
        page,
        app_state.config.posts_page_size,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), posts)))
}

/// PUT new content into a Post owned by the authenticated user. Connected
/// WebSocket clients are sent a `post_update` event.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Id of the Post to update"),
        ("x-connection-id" = Option<String>, Header, description = "The caller's WebSocket connection id, excluded from the broadcast")
    ),
    request_body = crate::params::post::UpsertParams,
    responses(
        (status = 200, description = "Successfully Updated Post", body = domain::posts::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found for this user"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(user_id): AuthenticatedUser,
    OriginConnection(origin): OriginConnection,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpsertParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Post with id: {id}");

    let post = PostApi::update(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        user_id,
        params.post_content,
        origin,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), post)))
}

/// DELETE a Post owned by the authenticated user. Connected WebSocket
/// clients are sent a `post_delete` event.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Id of the Post to delete"),
        ("x-connection-id" = Option<String>, Header, description = "The caller's WebSocket connection id, excluded from the broadcast")
    ),
    responses(
        (status = 200, description = "Successfully Deleted Post"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found for this user"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user_id): AuthenticatedUser,
    OriginConnection(origin): OriginConnection,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Post by id: {id}");

    PostApi::delete(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        user_id,
        origin,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), json!({"id": id}))))
}
