use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_models::AppError;

use crate::record::EntityKind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} {id} does not exist")]
    Missing { kind: EntityKind, id: Uuid },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { kind, .. } => AppError::not_found(&kind.to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Persistence seam shared by every entity kind.
///
/// Rows travel as JSON documents. `squad_id`, when given, is the tenant constraint
/// pushed down into the query; `None` means unconstrained.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(
        &self,
        kind: EntityKind,
        id: Uuid,
        squad_id: Option<Uuid>,
    ) -> Result<Option<Value>, StoreError>;

    async fn list(&self, kind: EntityKind, squad_id: Option<Uuid>) -> Result<Vec<Value>, StoreError>;

    async fn save(&self, kind: EntityKind, id: Uuid, row: Value) -> Result<Value, StoreError>;

    /// Marks the row deleted. Rows are never physically removed.
    async fn soft_delete(
        &self,
        kind: EntityKind,
        id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
