//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::NodeConfig,
    handlers::{follows, profiles, users, AppState},
    storage::Storage,
};

/// Build the complete application router with shared state.
pub fn build_router(storage: Arc<dyn Storage>, config: NodeConfig) -> Router {
    let state = AppState::new(storage, config);

    Router::new()
        // Users
        .route("/v1/users", post(users::register))
        .route("/v1/users/{id}", get(users::get_user))
        .route("/v1/users/{id}/followers", get(users::list_followers))
        .route("/v1/users/{id}/following", get(users::list_following))
        // Profiles
        .route("/v1/profiles", get(profiles::list))
        .route(
            "/v1/profiles/me",
            get(profiles::get_own).patch(profiles::update_own),
        )
        .route("/v1/profiles/{id}", get(profiles::get_by_id))
        // Follows
        .route("/v1/follows", post(follows::request_follow))
        .route("/v1/follows/{id}", delete(follows::unfollow))
        .route(
            "/v1/follow-requests",
            get(follows::list_requests).post(follows::respond),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
