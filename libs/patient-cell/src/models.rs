use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{Appointment, Patient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub address: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub surgeries: Vec<String>,
}

impl CreatePatientRequest {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            gender: None,
            birth_date: None,
            blood_type: None,
            allergies: vec![],
            surgeries: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub blood_type: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub surgeries: Option<Vec<String>>,
}

/// Which patients a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientListing {
    /// Full records the principal owns.
    #[default]
    Mine,
    /// Directory of every live patient in the squad.
    Squad,
    /// Directory including soft-deleted patients.
    SquadIncludingDeleted,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    #[serde(default)]
    pub listing: PatientListing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientSearchQuery {
    pub q: String,
}

/// Directory entry. Carries no clinical fields, so it is safe to show squad-wide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            user_id: patient.user_id,
            name: patient.name.clone(),
            deleted_at: patient.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PatientList {
    Records(Vec<Patient>),
    Directory(Vec<PatientSummary>),
}

impl PatientList {
    pub fn len(&self) -> usize {
        match self {
            PatientList::Records(patients) => patients.len(),
            PatientList::Directory(summaries) => summaries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A patient with the appointments the viewer may see.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetails {
    pub patient: Patient,
    pub age: Option<u32>,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarToggleResponse {
    pub id: Uuid,
    pub starred: bool,
}

#[derive(Debug, Clone)]
pub struct PatientValidationRules {
    pub name_length: (usize, usize),
    pub address_length: (usize, usize),
}

impl Default for PatientValidationRules {
    fn default() -> Self {
        Self {
            name_length: (3, 255),
            address_length: (3, 500),
        }
    }
}
