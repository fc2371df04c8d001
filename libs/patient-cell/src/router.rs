use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

pub fn patient_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_patient).get(list_patients))
        .route("/search", get(search_patients))
        .route("/starred", get(top_patients))
        .route(
            "/{id}",
            get(show_patient).put(update_patient).delete(delete_patient),
        )
        .route("/{id}/star", post(toggle_starred_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
