use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::{AppError, Principal};
use shared_utils::AppState;

use crate::models::UserListQuery;
use crate::services::UserService;

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", principal.id);

    let profile = UserService::new(state.store.clone()).current_user(&principal).await?;

    Ok(Json(json!({
        "user": profile,
        "squad_id": principal.squad_id
    })))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Value>, AppError> {
    let users = UserService::new(state.store.clone())
        .list_users(&principal, query.include_deleted, query.exclude_self)
        .await?;

    Ok(Json(json!({
        "users": users,
        "total": users.len()
    })))
}

#[axum::debug_handler]
pub async fn top_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, AppError> {
    let users = UserService::new(state.store.clone()).top_users(&principal).await?;
    Ok(Json(json!({ "users": users })))
}

#[axum::debug_handler]
pub async fn toggle_starred_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let starred = UserService::new(state.store.clone())
        .toggle_starred_user(&principal, user_id)
        .await?;

    Ok(Json(json!({ "id": user_id, "starred": starred })))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let report = UserService::new(state.store.clone())
        .delete_user(&principal, user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "report": report
    })))
}
