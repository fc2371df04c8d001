//! Tenant scope filter.
//!
//! Every lookup, listing, save and delete for users, patients and appointments goes
//! through [`ScopedStore`], which carries the acting principal's squad explicitly.
//! There is no ambient "current user": callers construct the scope per request.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::{AppError, Principal};

use crate::record::Record;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// No authenticated principal (login and similar flows). Queries are unconstrained.
    Unauthenticated,
    Squad(Uuid),
}

impl TenantScope {
    pub fn for_principal(principal: Option<&Principal>) -> Self {
        match principal {
            Some(principal) => TenantScope::Squad(principal.squad_id),
            None => TenantScope::Unauthenticated,
        }
    }

    pub fn squad_id(&self) -> Option<Uuid> {
        match self {
            TenantScope::Unauthenticated => None,
            TenantScope::Squad(squad_id) => Some(*squad_id),
        }
    }

    /// Whether a record belonging to `record_squad` is reachable under this scope.
    pub fn admits(&self, record_squad: Option<Uuid>) -> bool {
        match (self, record_squad) {
            (TenantScope::Unauthenticated, _) => true,
            (TenantScope::Squad(_), None) => true,
            (TenantScope::Squad(squad_id), Some(record_squad)) => *squad_id == record_squad,
        }
    }

    fn constraint_for<R: Record>(&self) -> Option<Uuid> {
        if R::TENANT_SCOPED {
            self.squad_id()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deleted {
    Exclude,
    Include,
}

/// A record store view constrained to one tenant scope.
pub struct ScopedStore<'a> {
    store: &'a dyn RecordStore,
    scope: TenantScope,
}

impl<'a> ScopedStore<'a> {
    pub fn new(store: &'a dyn RecordStore, principal: Option<&Principal>) -> Self {
        Self {
            store,
            scope: TenantScope::for_principal(principal),
        }
    }

    pub fn with_scope(store: &'a dyn RecordStore, scope: TenantScope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> TenantScope {
        self.scope
    }

    /// Live record by id. Absent, soft-deleted and other-tenant records are all `NotFound`.
    pub async fn find<R: Record>(&self, id: Uuid) -> Result<R, AppError> {
        self.find_with(id, Deleted::Exclude).await
    }

    pub async fn find_including_deleted<R: Record>(&self, id: Uuid) -> Result<R, AppError> {
        self.find_with(id, Deleted::Include).await
    }

    pub async fn list<R, F>(&self, predicate: F) -> Result<Vec<R>, AppError>
    where
        R: Record,
        F: Fn(&R) -> bool + Send,
    {
        self.list_with(predicate, Deleted::Exclude).await
    }

    /// Listing that also returns soft-deleted rows, for cross-referential views.
    pub async fn list_including_deleted<R, F>(&self, predicate: F) -> Result<Vec<R>, AppError>
    where
        R: Record,
        F: Fn(&R) -> bool + Send,
    {
        self.list_with(predicate, Deleted::Include).await
    }

    pub async fn save<R: Record>(&self, record: &R) -> Result<R, AppError> {
        if R::TENANT_SCOPED && !self.scope.admits(record.squad_id()) {
            warn!("Rejected save of {} {} outside tenant scope", R::KIND, record.id());
            return Err(AppError::not_found(&R::KIND.to_string()));
        }

        let row = serde_json::to_value(record).map_err(|e| AppError::Internal(e.to_string()))?;
        let saved = self.store.save(R::KIND, record.id(), row).await?;
        decode(saved)
    }

    pub async fn soft_delete<R: Record>(&self, record: &R) -> Result<(), AppError> {
        // Re-resolve through the scope so a foreign record can never be touched.
        let current: R = self.find_including_deleted(record.id()).await?;
        if current.is_deleted() {
            debug!("{} {} already deleted", R::KIND, record.id());
            return Ok(());
        }

        self.store.soft_delete(R::KIND, record.id(), Utc::now()).await?;
        Ok(())
    }

    async fn find_with<R: Record>(&self, id: Uuid, deleted: Deleted) -> Result<R, AppError> {
        let row = self
            .store
            .find(R::KIND, id, self.scope.constraint_for::<R>())
            .await?
            .ok_or_else(|| AppError::not_found(&R::KIND.to_string()))?;

        let record: R = decode(row)?;
        if deleted == Deleted::Exclude && record.is_deleted() {
            return Err(AppError::not_found(&R::KIND.to_string()));
        }
        if !self.scope.admits(record.squad_id()) {
            return Err(AppError::not_found(&R::KIND.to_string()));
        }
        Ok(record)
    }

    async fn list_with<R, F>(&self, predicate: F, deleted: Deleted) -> Result<Vec<R>, AppError>
    where
        R: Record,
        F: Fn(&R) -> bool + Send,
    {
        let rows = self.store.list(R::KIND, self.scope.constraint_for::<R>()).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record: R = decode(row)?;
            if deleted == Deleted::Exclude && record.is_deleted() {
                continue;
            }
            if self.scope.admits(record.squad_id()) && predicate(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn decode<R: Record>(row: Value) -> Result<R, AppError> {
    serde_json::from_value(row)
        .map_err(|e| AppError::Database(format!("Corrupt {} row: {}", R::KIND, e)))
}
