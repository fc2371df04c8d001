use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use shared_database::{RecordStore, ScopedStore};
use shared_models::{AppError, Principal, User};

use crate::models::UserProfile;

pub struct UserService {
    pub(crate) store: Arc<dyn RecordStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub(crate) fn scoped<'a>(&'a self, principal: &Principal) -> ScopedStore<'a> {
        ScopedStore::new(self.store.as_ref(), Some(principal))
    }

    pub async fn current_user(&self, principal: &Principal) -> Result<UserProfile, AppError> {
        let user: User = self.scoped(principal).find(principal.id).await?;
        Ok(UserProfile::from(&user))
    }

    /// Squad directory ordered by name.
    pub async fn list_users(
        &self,
        principal: &Principal,
        include_deleted: bool,
        exclude_self: bool,
    ) -> Result<Vec<UserProfile>, AppError> {
        let scoped = self.scoped(principal);
        let keep = |user: &User| !(exclude_self && user.id == principal.id);

        let mut users: Vec<User> = if include_deleted {
            scoped.list_including_deleted(keep).await?
        } else {
            scoped.list(keep).await?
        };
        users.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!("Listed {} users for {}", users.len(), principal.id);
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn toggle_starred_user(&self, principal: &Principal, user_id: Uuid) -> Result<bool, AppError> {
        let scoped = self.scoped(principal);
        let _: User = scoped.find(user_id).await?;

        let mut me: User = scoped.find(principal.id).await?;
        let starred = me.toggle_starred_user(user_id);
        me.updated_at = Utc::now();
        scoped.save(&me).await?;

        debug!("User {} starred user {}: {}", principal.id, user_id, starred);
        Ok(starred)
    }

    /// Starred users still live in the squad, most recently updated first.
    pub async fn top_users(&self, principal: &Principal) -> Result<Vec<UserProfile>, AppError> {
        let scoped = self.scoped(principal);
        let me: User = scoped.find(principal.id).await?;
        let starred: HashSet<Uuid> = me.starred_users.iter().copied().collect();

        let mut users: Vec<User> = scoped.list(|user: &User| starred.contains(&user.id)).await?;
        users.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

        Ok(users.iter().map(UserProfile::from).collect())
    }
}
