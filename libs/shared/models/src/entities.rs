// libs/shared/models/src/entities.rs
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::UserType;

// ==============================================================================
// USERS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub squad_id: Uuid,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub starred_patients: Vec<Uuid>,
    #[serde(default)]
    pub starred_users: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(squad_id: Uuid, user_type: UserType, name: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            squad_id,
            user_type,
            name: name.to_string(),
            email: email.to_string(),
            image: None,
            starred_patients: Vec::new(),
            starred_users: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Adds or removes a patient bookmark. Returns whether the patient is starred afterwards.
    pub fn toggle_starred_patient(&mut self, patient_id: Uuid) -> bool {
        toggle_in_ordered_set(&mut self.starred_patients, patient_id)
    }

    /// Adds or removes a user bookmark. Returns whether the user is starred afterwards.
    pub fn toggle_starred_user(&mut self, user_id: Uuid) -> bool {
        toggle_in_ordered_set(&mut self.starred_users, user_id)
    }
}

fn toggle_in_ordered_set(set: &mut Vec<Uuid>, id: Uuid) -> bool {
    if let Some(position) = set.iter().position(|existing| *existing == id) {
        set.remove(position);
        false
    } else {
        set.push(id);
        true
    }
}

// ==============================================================================
// PATIENTS & DOCTORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub squad_id: Uuid,
    /// Owner: the user that created the record.
    pub user_id: Uuid,
    pub name: String,
    pub address: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub surgeries: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn age(&self) -> Option<u32> {
        let today = Utc::now().date_naive();
        self.birth_date.and_then(|birth_date| today.years_since(birth_date))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialty: String,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub squad_id: Uuid,
    /// Creator of the appointment.
    pub user_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub team: BTreeSet<Uuid>,
    pub start_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub progress: u8,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub cost: Option<i64>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

impl Appointment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Active appointments occupy their slot: not cancelled and not soft-deleted.
    pub fn occupies_slot(&self) -> bool {
        !self.is_deleted() && self.status != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AppointmentStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::NotStarted => write!(f, "Not Started"),
            AppointmentStatus::InProgress => write!(f, "In Progress"),
            AppointmentStatus::OnHold => write!(f, "On Hold"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
