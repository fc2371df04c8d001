use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn user_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_users))
        .route("/me", get(handlers::get_profile))
        .route("/starred", get(handlers::top_users))
        .route("/{user_id}", delete(handlers::delete_user))
        .route("/{user_id}/star", post(handlers::toggle_starred_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
