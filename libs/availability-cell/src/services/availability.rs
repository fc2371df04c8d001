// libs/availability-cell/src/services/availability.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{RecordStore, ScopedStore};
use shared_models::{AppError, Appointment, Doctor, Patient, Principal, User};

use crate::models::{AvailabilityRole, AvailableCandidate};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a requested slot. Naive inputs are taken as UTC; a bare date means midnight.
pub fn parse_slot(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    warn!("Rejected unparsable availability date '{}'", raw);
    Err(AppError::ValidationError(format!("Invalid date: '{}'", raw)))
}

pub struct AvailabilityService {
    store: Arc<dyn RecordStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Candidates of `role` with no active booking at exactly `date`, ordered by name.
    pub async fn find_available(
        &self,
        principal: Option<&Principal>,
        role: AvailabilityRole,
        date: &str,
    ) -> Result<Vec<AvailableCandidate>, AppError> {
        let slot = parse_slot(date)?;
        self.find_available_at(principal, role, slot).await
    }

    pub async fn find_available_at(
        &self,
        principal: Option<&Principal>,
        role: AvailabilityRole,
        slot: DateTime<Utc>,
    ) -> Result<Vec<AvailableCandidate>, AppError> {
        debug!("Resolving {:?} availability at {}", role, slot);

        let scoped = ScopedStore::new(self.store.as_ref(), principal);
        let user_type = role.user_type();

        let users: Vec<User> = scoped.list(|user: &User| user.user_type == user_type).await?;
        let held = Self::slot_holders(&scoped, role, slot, None).await?;

        let mut candidates: Vec<AvailableCandidate> = match role {
            AvailabilityRole::Doctor => {
                let profiles = Self::doctor_profiles(&scoped, &users).await?;
                users
                    .into_iter()
                    .filter(|user| !held.contains(&user.id))
                    .map(|user| AvailableCandidate {
                        specialty: profiles.get(&user.id).map(|doctor| doctor.specialty.clone()),
                        blood_type: None,
                        id: user.id,
                        name: user.name,
                        image: user.image,
                    })
                    .collect()
            }
            AvailabilityRole::Patient => {
                let profiles = Self::patient_profiles(&scoped).await?;
                users
                    .into_iter()
                    .filter(|user| !held.contains(&user.id))
                    .map(|user| AvailableCandidate {
                        specialty: None,
                        blood_type: profiles
                            .get(&user.id)
                            .and_then(|patient| patient.blood_type.clone()),
                        id: user.id,
                        name: user.name,
                        image: user.image,
                    })
                    .collect()
            }
        };

        candidates.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!("{} {:?} candidates free at {}", candidates.len(), role, slot);
        Ok(candidates)
    }

    /// User ids holding an active appointment that starts exactly at `slot`.
    ///
    /// Doctors hold a slot through `assigned_to`; patients through the appointment's
    /// `patient_id`, which references the patient profile the user owns.
    pub async fn slot_holders(
        scoped: &ScopedStore<'_>,
        role: AvailabilityRole,
        slot: DateTime<Utc>,
        exclude_appointment: Option<Uuid>,
    ) -> Result<HashSet<Uuid>, AppError> {
        let booked: Vec<Appointment> = scoped
            .list(|appointment: &Appointment| {
                appointment.occupies_slot()
                    && appointment.start_date == slot
                    && Some(appointment.id) != exclude_appointment
            })
            .await?;

        let holders = match role {
            AvailabilityRole::Doctor => booked
                .iter()
                .filter_map(|appointment| appointment.assigned_to)
                .collect(),
            AvailabilityRole::Patient => {
                let patient_ids: HashSet<Uuid> = booked
                    .iter()
                    .filter_map(|appointment| appointment.patient_id)
                    .collect();
                let referenced: Vec<Patient> = scoped
                    .list_including_deleted(|patient: &Patient| patient_ids.contains(&patient.id))
                    .await?;
                referenced.into_iter().map(|patient| patient.user_id).collect()
            }
        };

        Ok(holders)
    }

    async fn doctor_profiles(
        scoped: &ScopedStore<'_>,
        users: &[User],
    ) -> Result<HashMap<Uuid, Doctor>, AppError> {
        let user_ids: HashSet<Uuid> = users.iter().map(|user| user.id).collect();
        let doctors: Vec<Doctor> = scoped
            .list(|doctor: &Doctor| user_ids.contains(&doctor.user_id))
            .await?;
        Ok(doctors.into_iter().map(|doctor| (doctor.user_id, doctor)).collect())
    }

    async fn patient_profiles(scoped: &ScopedStore<'_>) -> Result<HashMap<Uuid, Patient>, AppError> {
        let patients: Vec<Patient> = scoped.list(|_: &Patient| true).await?;
        Ok(patients.into_iter().map(|patient| (patient.user_id, patient)).collect())
    }
}
