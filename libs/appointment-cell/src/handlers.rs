// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, Principal};
use shared_utils::AppState;

use crate::models::{AppointmentListQuery, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::AppointmentService;

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(state.store.clone());
    let appointment = service.create_appointment(&principal, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment created"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(state.store.clone());

    let appointments = if query.include_deleted {
        service.list_appointments_including_deleted(&principal, query.intent).await?
    } else {
        service.list_appointments(&principal, query.intent).await?
    };

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
        "intent": query.intent,
    })))
}

#[axum::debug_handler]
pub async fn get_catalog(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(state.store.clone());
    let catalog = service.catalog(&principal).await?;
    Ok(Json(json!(catalog)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(state.store.clone());
    let appointment = service.get_appointment(&principal, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(state.store.clone());
    let appointment = service.update_appointment(&principal, appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(state.store.clone());
    service.delete_appointment(&principal, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted"
    })))
}
