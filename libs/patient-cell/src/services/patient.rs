use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{RecordStore, ScopedStore};
use shared_models::{
    AppError, Appointment, EventOutbox, Patient, PatientAction, PatientEvent, Principal, User,
};
use visibility_cell::{VisibilityIntent, VisibilityResolver};

use crate::models::{
    CreatePatientRequest, PatientDetails, PatientList, PatientListing, PatientSummary,
    PatientValidationRules, UpdatePatientRequest,
};

pub struct PatientService {
    store: Arc<dyn RecordStore>,
    outbox: EventOutbox,
    validation_rules: PatientValidationRules,
}

impl PatientService {
    pub fn new(store: Arc<dyn RecordStore>, outbox: EventOutbox) -> Self {
        Self {
            store,
            outbox,
            validation_rules: PatientValidationRules::default(),
        }
    }

    fn scoped<'a>(&'a self, principal: &Principal) -> ScopedStore<'a> {
        ScopedStore::new(self.store.as_ref(), Some(principal))
    }

    pub async fn create_patient(
        &self,
        principal: &Principal,
        request: CreatePatientRequest,
    ) -> Result<Patient, AppError> {
        debug!("Creating patient '{}' for user {}", request.name, principal.id);

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            squad_id: principal.squad_id,
            user_id: principal.id,
            name: request.name.trim().to_string(),
            address: request.address.trim().to_string(),
            gender: request.gender,
            birth_date: request.birth_date,
            blood_type: request.blood_type,
            allergies: request.allergies,
            surgeries: request.surgeries,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.validate(&patient)?;

        let saved = self.scoped(principal).save(&patient).await?;
        info!("Patient {} created by user {}", saved.id, principal.id);

        self.outbox.enqueue(PatientEvent::new(PatientAction::Create, saved.clone()));
        Ok(saved)
    }

    pub async fn get_patient(&self, principal: &Principal, patient_id: Uuid) -> Result<Patient, AppError> {
        let patient: Patient = self.scoped(principal).find(patient_id).await?;
        VisibilityResolver::ensure_can_view(principal, &patient)?;
        Ok(patient)
    }

    /// The patient together with its appointments the viewer can see (owned, assigned,
    /// team or public), ordered by start date.
    pub async fn show_patient(
        &self,
        principal: &Principal,
        patient_id: Uuid,
    ) -> Result<PatientDetails, AppError> {
        let patient = self.get_patient(principal, patient_id).await?;

        let predicate = VisibilityIntent::SharedView.predicate();
        let mut appointments: Vec<Appointment> = self
            .scoped(principal)
            .list(|appointment: &Appointment| {
                appointment.patient_id == Some(patient_id) && predicate.evaluate(principal, appointment)
            })
            .await?;
        appointments.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));

        Ok(PatientDetails {
            age: patient.age(),
            patient,
            appointments,
        })
    }

    pub async fn update_patient(
        &self,
        principal: &Principal,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, AppError> {
        let scoped = self.scoped(principal);
        let mut patient: Patient = scoped.find(patient_id).await?;
        VisibilityResolver::ensure_can_mutate(principal, &patient)?;

        if let Some(name) = request.name {
            patient.name = name.trim().to_string();
        }
        if let Some(address) = request.address {
            patient.address = address.trim().to_string();
        }
        if let Some(gender) = request.gender {
            patient.gender = Some(gender);
        }
        if let Some(birth_date) = request.birth_date {
            patient.birth_date = Some(birth_date);
        }
        if let Some(blood_type) = request.blood_type {
            patient.blood_type = Some(blood_type);
        }
        if let Some(allergies) = request.allergies {
            patient.allergies = allergies;
        }
        if let Some(surgeries) = request.surgeries {
            patient.surgeries = surgeries;
        }
        self.validate(&patient)?;

        patient.updated_at = Utc::now();
        let saved = scoped.save(&patient).await?;
        info!("Patient {} updated by user {}", saved.id, principal.id);

        self.outbox.enqueue(PatientEvent::new(PatientAction::Update, saved.clone()));
        Ok(saved)
    }

    pub async fn delete_patient(&self, principal: &Principal, patient_id: Uuid) -> Result<(), AppError> {
        let scoped = self.scoped(principal);
        let patient: Patient = scoped.find(patient_id).await?;
        VisibilityResolver::ensure_can_mutate(principal, &patient)?;

        scoped.soft_delete(&patient).await?;
        info!("Patient {} deleted by user {}", patient_id, principal.id);

        let mut snapshot = patient;
        snapshot.deleted_at = Some(Utc::now());
        self.outbox.enqueue(PatientEvent::new(PatientAction::Delete, snapshot));
        Ok(())
    }

    pub async fn list_patients(
        &self,
        principal: &Principal,
        listing: PatientListing,
    ) -> Result<PatientList, AppError> {
        let scoped = self.scoped(principal);

        let list = match listing {
            PatientListing::Mine => {
                let mut patients: Vec<Patient> = scoped
                    .list(|patient: &Patient| patient.user_id == principal.id)
                    .await?;
                sort_by_name(&mut patients);
                PatientList::Records(patients)
            }
            PatientListing::Squad => {
                let mut patients: Vec<Patient> = scoped.list(|_: &Patient| true).await?;
                sort_by_name(&mut patients);
                PatientList::Directory(patients.iter().map(PatientSummary::from).collect())
            }
            PatientListing::SquadIncludingDeleted => {
                let mut patients: Vec<Patient> = scoped.list_including_deleted(|_: &Patient| true).await?;
                sort_by_name(&mut patients);
                PatientList::Directory(patients.iter().map(PatientSummary::from).collect())
            }
        };

        debug!("{:?} listing for user {} returned {} patients", listing, principal.id, list.len());
        Ok(list)
    }

    /// Case-insensitive substring match on name or address within the squad.
    pub async fn search_patients(
        &self,
        principal: &Principal,
        term: &str,
    ) -> Result<Vec<PatientSummary>, AppError> {
        let needle = term.trim().to_lowercase();

        let mut patients: Vec<Patient> = self
            .scoped(principal)
            .list(|patient: &Patient| {
                patient.name.to_lowercase().contains(&needle)
                    || patient.address.to_lowercase().contains(&needle)
            })
            .await?;
        sort_by_name(&mut patients);

        Ok(patients.iter().map(PatientSummary::from).collect())
    }

    /// Flips the bookmark on the principal's user record; returns whether it is now starred.
    pub async fn toggle_starred_patient(
        &self,
        principal: &Principal,
        patient_id: Uuid,
    ) -> Result<bool, AppError> {
        let scoped = self.scoped(principal);
        let _: Patient = scoped.find(patient_id).await?;

        let mut user: User = scoped.find(principal.id).await?;
        let starred = user.toggle_starred_patient(patient_id);
        user.updated_at = Utc::now();
        scoped.save(&user).await?;

        debug!("User {} starred patient {}: {}", principal.id, patient_id, starred);
        Ok(starred)
    }

    /// Starred patients still reachable in the squad, most recently updated first.
    pub async fn top_patients(&self, principal: &Principal) -> Result<Vec<PatientSummary>, AppError> {
        let scoped = self.scoped(principal);
        let user: User = scoped.find(principal.id).await?;
        let starred: HashSet<Uuid> = user.starred_patients.iter().copied().collect();

        let mut patients: Vec<Patient> = scoped
            .list(|patient: &Patient| starred.contains(&patient.id))
            .await?;
        patients.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

        Ok(patients.iter().map(PatientSummary::from).collect())
    }

    fn validate(&self, patient: &Patient) -> Result<(), AppError> {
        check_length("name", &patient.name, self.validation_rules.name_length)?;
        check_length("address", &patient.address, self.validation_rules.address_length)
    }
}

fn check_length(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), AppError> {
    let length = value.chars().count();
    if length < min || length > max {
        return Err(AppError::ValidationError(format!(
            "The {} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

fn sort_by_name(patients: &mut [Patient]) {
    patients.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}
