// libs/appointment-cell/src/models.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::AppointmentStatus;
use visibility_cell::VisibilityIntent;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub team: BTreeSet<Uuid>,
    pub start_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub public: bool,
    pub progress: Option<u8>,
    pub category: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub cost: Option<i64>,
    pub comments: Option<String>,
}

impl CreateAppointmentRequest {
    pub fn at(start_date: DateTime<Utc>) -> Self {
        Self {
            patient_id: None,
            assigned_to: None,
            team: BTreeSet::new(),
            start_date,
            due_date: None,
            status: None,
            public: false,
            progress: None,
            category: None,
            labels: vec![],
            cost: None,
            comments: None,
        }
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub team: Option<BTreeSet<Uuid>>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub public: Option<bool>,
    pub progress: Option<u8>,
    pub category: Option<String>,
    pub labels: Option<Vec<String>>,
    pub cost: Option<i64>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    #[serde(default)]
    pub intent: VisibilityIntent,
    #[serde(default)]
    pub include_deleted: bool,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// Distinct categories and labels in use across the squad's appointments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentCatalog {
    pub categories: Vec<String>,
    pub labels: Vec<String>,
}

// ==============================================================================
// VALIDATION RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct AppointmentValidationRules {
    pub max_progress: u8,
    pub max_category_length: usize,
    pub default_category: &'static str,
}

impl Default for AppointmentValidationRules {
    fn default() -> Self {
        Self {
            max_progress: 100,
            max_category_length: 255,
            default_category: "Uncategorized",
        }
    }
}
