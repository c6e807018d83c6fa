//! HTTP routes.
//!
//! The management API and the webhook trigger route are separate routers so
//! they can be served on different ports. Authentication is left to a
//! fronting proxy; by default both listeners bind to loopback.

mod commands;
mod error;
mod webhooks;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

pub use error::ApiError;

use crate::state::AppState;

/// Management API: catalogue, execution and webhook administration.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/command/",
            get(commands::list_commands)
                .post(commands::execute_command)
                .put(commands::add_command)
                .delete(commands::delete_command),
        )
        .route("/command/stream", post(commands::stream_command))
        .route("/is-command-manipulation-allowed", get(commands::manipulation_allowed))
        .route("/create-webhook/", put(webhooks::create_webhook))
        .route("/update-webhook/", put(webhooks::update_webhook))
        .route("/delete-webhook/", axum::routing::delete(webhooks::delete_webhook))
        .route("/get-webhook/", get(webhooks::get_webhook))
        .with_state(state)
}

/// Webhook trigger route, with and without a trailing slash.
pub fn webhook_router(state: Arc<AppState>) -> Router {
    let route = state.webhook_route.clone();
    Router::new()
        .route(&format!("{route}/{{uuid}}"), get(webhooks::trigger_webhook))
        .route(&format!("{route}/{{uuid}}/"), get(webhooks::trigger_webhook))
        .with_state(state)
}
