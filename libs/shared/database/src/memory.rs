use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::record::EntityKind;
use crate::store::{RecordStore, StoreError};

type Table = HashMap<Uuid, Value>;

/// Process-local record store backed by JSON rows.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows of a kind, deleted rows included.
    pub async fn row_count(&self, kind: EntityKind) -> usize {
        let tables = self.tables.read().await;
        tables.get(&kind).map(|table| table.len()).unwrap_or(0)
    }
}

fn in_squad(row: &Value, squad_id: Option<Uuid>) -> bool {
    match squad_id {
        None => true,
        Some(squad_id) => {
            row.get("squad_id").and_then(Value::as_str) == Some(squad_id.to_string().as_str())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(
        &self,
        kind: EntityKind,
        id: Uuid,
        squad_id: Option<Uuid>,
    ) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.read().await;
        let row = tables
            .get(&kind)
            .and_then(|table| table.get(&id))
            .filter(|row| in_squad(row, squad_id))
            .cloned();
        Ok(row)
    }

    async fn list(&self, kind: EntityKind, squad_id: Option<Uuid>) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(&kind)
            .map(|table| {
                table
                    .values()
                    .filter(|row| in_squad(row, squad_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn save(&self, kind: EntityKind, id: Uuid, row: Value) -> Result<Value, StoreError> {
        debug!("Saving {} {}", kind, id);
        let mut tables = self.tables.write().await;
        tables.entry(kind).or_default().insert(id, row.clone());
        Ok(row)
    }

    async fn soft_delete(
        &self,
        kind: EntityKind,
        id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&kind)
            .and_then(|table| table.get_mut(&id))
            .ok_or(StoreError::Missing { kind, id })?;

        // Keep the first deletion instant.
        if row.get("deleted_at").map_or(true, Value::is_null) {
            row["deleted_at"] = json!(deleted_at);
            debug!("Soft-deleted {} {}", kind, id);
        }
        Ok(())
    }
}
