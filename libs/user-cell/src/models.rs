use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{User, UserType};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub exclude_self: bool,
}

/// Public face of a user; bookmarks stay private to their owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            user_type: user.user_type,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            deleted_at: user.deleted_at,
        }
    }
}

/// Outcome of a completed user deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadeReport {
    pub user_id: Uuid,
    pub appointments_deleted: usize,
}
