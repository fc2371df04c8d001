use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, Principal};
use shared_utils::AppState;

use crate::models::{AvailabilityQuery, AvailabilityRole, AvailabilityResponse};
use crate::services::{parse_slot, AvailabilityService};

#[axum::debug_handler]
pub async fn find_available(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role): Path<AvailabilityRole>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(state.store.clone());

    let slot = parse_slot(&query.date)?;
    let candidates = service.find_available_at(Some(&principal), role, slot).await?;

    let response = AvailabilityResponse {
        role,
        slot,
        total: candidates.len(),
        candidates,
    };

    Ok(Json(json!(response)))
}
