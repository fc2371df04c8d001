use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use availability_cell::availability_routes;
use notification_cell::{notification_routes, SquadBroadcaster};
use patient_cell::patient_routes;
use shared_utils::AppState;
use user_cell::user_routes;

pub fn create_router(state: AppState, broadcaster: Arc<SquadBroadcaster>) -> Router {
    Router::new()
        .route("/", get(|| async { "Squad Clinic API is running!" }))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/events", notification_routes(state, broadcaster))
}
