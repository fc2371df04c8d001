use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::UserType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityRole {
    Doctor,
    Patient,
}

impl AvailabilityRole {
    pub fn user_type(&self) -> UserType {
        match self {
            AvailabilityRole::Doctor => UserType::Doctor,
            AvailabilityRole::Patient => UserType::Patient,
        }
    }
}

/// A user with no booking at the requested instant, joined with its role profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableCandidate {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub role: AvailabilityRole,
    pub slot: DateTime<Utc>,
    pub candidates: Vec<AvailableCandidate>,
    pub total: usize,
}
