//! API Router configuration

use crate::api::handlers;
use crate::api::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the main API router.
///
/// When `authorization` is true, every `/api/v1/keys` route requires a token
/// issued by `/api/v1/login`.
pub fn create_router(state: AppState, authorization: bool) -> Router {
    let mut key_routes: Router<AppState> = Router::new()
        .route("/api/v1/keys", post(handlers::set_value))
        .route("/api/v1/keys/", post(handlers::set_value))
        // The single segment is a glob pattern for GET and a key for DELETE
        .route(
            "/api/v1/keys/:key",
            get(handlers::keys).delete(handlers::remove),
        )
        .route("/api/v1/keys/:key/values", get(handlers::get_value))
        .route(
            "/api/v1/keys/:key/values/:index",
            get(handlers::get_indexed),
        )
        .route(
            "/api/v1/keys/:key/expires",
            get(handlers::get_expires).post(handlers::set_expires),
        );

    if authorization {
        key_routes = key_routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_token,
        ));
    }

    Router::new()
        .route("/api/v1/ping", get(handlers::ping))
        .route("/api/v1/stats", get(handlers::stats))
        .route("/api/v1/login", post(handlers::login))
        .merge(key_routes)
        .fallback(handlers::not_found)
        .layer(middleware::map_response(handlers::method_not_allowed_as_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
