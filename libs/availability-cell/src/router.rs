use axum::{middleware, routing::get, Router};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn availability_routes(state: AppState) -> Router {
    Router::new()
        .route("/{role}", get(handlers::find_available))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
