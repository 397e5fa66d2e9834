use crate::{
    controller::{
        health_check_controller, home_controller, post_controller, user_controller,
        user_session_controller,
    },
    middleware::auth::require_auth,
    params,
    response,
    websocket::handler::ws_handler,
    AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use ws::Hub;

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "rest_ws API"
        ),
        paths(
            home_controller::index,
            health_check_controller::health_check,
            user_controller::sign_up,
            user_controller::me,
            user_session_controller::login,
            post_controller::create,
            post_controller::read,
            post_controller::index,
            post_controller::update,
            post_controller::delete,
        ),
        components(
            schemas(
                domain::posts::Model,
                domain::users::Model,
                domain::jwt::Jwt,
                params::post::UpsertParams,
                params::user::Credentials,
                response::post::PostResponse,
                response::user::SignUpResponse,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "rest_ws", description = "Posts API with real-time WebSocket notifications")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines the access token requirement for the protected endpoints in OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(home_routes())
        .merge(health_routes())
        .merge(user_session_routes(app_state.clone()))
        .merge(post_routes(app_state.clone()))
        .merge(protected_post_routes(app_state.clone()))
        .merge(protected_user_routes(app_state.clone()))
        .merge(ws_routes(Arc::clone(&app_state.hub)))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn home_routes() -> Router {
    Router::new().route("/", get(home_controller::index))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/signup", post(user_controller::sign_up))
        .route("/login", post(user_session_controller::login))
        .with_state(app_state)
}

fn post_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/posts", get(post_controller::index))
        .route("/posts/:id", get(post_controller::read))
        .with_state(app_state)
}

fn protected_post_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/v1/posts", post(post_controller::create))
        .route("/api/v1/posts/:id", put(post_controller::update))
        .route("/api/v1/posts/:id", delete(post_controller::delete))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn protected_user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/v1/me", get(user_controller::me))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

// The upgrade endpoint only needs the hub, never the database.
fn ws_routes(hub: Arc<Hub>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(hub)
}
