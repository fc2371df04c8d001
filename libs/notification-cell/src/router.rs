use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;
use crate::services::SquadBroadcaster;

/// Authentication runs against the shared app state; the stream itself only needs
/// the broadcaster.
pub fn notification_routes(state: AppState, broadcaster: Arc<SquadBroadcaster>) -> Router {
    Router::new()
        .route("/", get(handlers::stream_squad_events))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
        .with_state(broadcaster)
}
