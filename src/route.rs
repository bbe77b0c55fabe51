//! Route definitions for the content API.
//!
//! The generic collection routes dispatch on the `{resource}` path
//! segment; the registry decides whether the segment is served. Static
//! routes (stats, enrollment count, login) take precedence over the
//! captures, and `/health` sits outside the authenticated `/api` nest.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::database::AppState;
use crate::handler::{
    create_resource, delete_resource, enroll_count, get_resource, get_stats, health,
    list_resource, login, update_resource, update_stats,
};
use crate::middleware::auth_middleware;

/// Creates and configures the application router.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use academy_api::config::Config;
/// # use academy_api::database::{init_db, AppState};
/// # use academy_api::media::MemoryMediaHost;
/// # use academy_api::route::create_app;
/// # let config = Config::from_env();
/// # let db = init_db(&config.database_path).unwrap();
/// let state = AppState {
///     db: Arc::new(db),
///     media: Arc::new(MemoryMediaHost::new()),
///     config: Arc::new(config),
/// };
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    // The body limit must clear the image ceiling so oversized uploads
    // reach the size check and get a proper validation error instead of a
    // bare rejection.
    let body_limit = state.config.max_upload_bytes * 2 + 1024 * 1024;

    let api_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/stats", get(get_stats).put(update_stats))
        .route("/enroll/count", get(enroll_count))
        .route("/{resource}", get(list_resource).post(create_resource))
        .route(
            "/{resource}/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
