use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, Principal};
use shared_utils::AppState;

use crate::models::{
    CreatePatientRequest, PatientListQuery, PatientSearchQuery, StarToggleResponse,
    UpdatePatientRequest,
};
use crate::services::PatientService;

fn service(state: &AppState) -> PatientService {
    PatientService::new(state.store.clone(), state.outbox.clone())
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = service(&state).create_patient(&principal, request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = service(&state).list_patients(&principal, query.listing).await?;

    Ok(Json(json!({
        "listing": query.listing,
        "total": patients.len(),
        "patients": patients,
    })))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = service(&state).search_patients(&principal, &query.q).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn top_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let patients = service(&state).top_patients(&principal).await?;
    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn show_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let details = service(&state).show_patient(&principal, patient_id).await?;
    Ok(Json(json!(details)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = service(&state).update_patient(&principal, patient_id, request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    service(&state).delete_patient(&principal, patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient deleted"
    })))
}

#[axum::debug_handler]
pub async fn toggle_starred_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let starred = service(&state).toggle_starred_patient(&principal, patient_id).await?;
    Ok(Json(json!(StarToggleResponse { id: patient_id, starred })))
}
