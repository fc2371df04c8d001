// libs/appointment-cell/src/services/booking.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::{AvailabilityRole, AvailabilityService};
use shared_database::{RecordStore, ScopedStore};
use shared_models::{AppError, Appointment, AppointmentStatus, Patient, Principal, User};
use visibility_cell::{VisibilityIntent, VisibilityResolver};

use crate::models::{
    AppointmentCatalog, AppointmentValidationRules, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};

pub struct AppointmentService {
    store: Arc<dyn RecordStore>,
    validation_rules: AppointmentValidationRules,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            validation_rules: AppointmentValidationRules::default(),
        }
    }

    fn scoped<'a>(&'a self, principal: &Principal) -> ScopedStore<'a> {
        ScopedStore::new(self.store.as_ref(), Some(principal))
    }

    // ==========================================================================
    // CREATE
    // ==========================================================================

    /// Books an appointment owned by `principal` in the principal's squad.
    ///
    /// The conflict check and the save are separate store calls, so two concurrent
    /// requests for the same assignee and slot can both succeed.
    pub async fn create_appointment(
        &self,
        principal: &Principal,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        info!("User {} booking appointment at {}", principal.id, request.start_date);

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            squad_id: principal.squad_id,
            user_id: principal.id,
            patient_id: request.patient_id,
            assigned_to: request.assigned_to,
            team: request.team,
            start_date: request.start_date,
            due_date: request.due_date,
            status: request.status.unwrap_or_default(),
            public: request.public,
            progress: request.progress.unwrap_or(0),
            category: self.category_or_default(request.category),
            labels: request.labels,
            cost: request.cost,
            comments: request.comments,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.validate(&appointment)?;

        let scoped = self.scoped(principal);
        Self::resolve_references(&scoped, &appointment).await?;
        Self::ensure_slot_free(&scoped, &appointment).await?;

        let saved = scoped.save(&appointment).await?;
        info!("Appointment {} created by user {}", saved.id, principal.id);
        Ok(saved)
    }

    // ==========================================================================
    // READ
    // ==========================================================================

    pub async fn get_appointment(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppError> {
        let appointment: Appointment = self.scoped(principal).find(appointment_id).await?;
        VisibilityResolver::ensure_can_view(principal, &appointment)?;
        Ok(appointment)
    }

    /// Live appointments matching `intent`, ordered by start date.
    pub async fn list_appointments(
        &self,
        principal: &Principal,
        intent: VisibilityIntent,
    ) -> Result<Vec<Appointment>, AppError> {
        let predicate = intent.predicate();
        debug!("Listing appointments for user {} where {}", principal.id, predicate);

        let mut appointments: Vec<Appointment> = self
            .scoped(principal)
            .list(|appointment: &Appointment| predicate.evaluate(principal, appointment))
            .await?;
        sort_by_start(&mut appointments);
        Ok(appointments)
    }

    /// Same as [`Self::list_appointments`] but soft-deleted rows are kept.
    pub async fn list_appointments_including_deleted(
        &self,
        principal: &Principal,
        intent: VisibilityIntent,
    ) -> Result<Vec<Appointment>, AppError> {
        let predicate = intent.predicate();

        let mut appointments: Vec<Appointment> = self
            .scoped(principal)
            .list_including_deleted(|appointment: &Appointment| {
                predicate.evaluate(principal, appointment)
            })
            .await?;
        sort_by_start(&mut appointments);
        Ok(appointments)
    }

    pub async fn catalog(&self, principal: &Principal) -> Result<AppointmentCatalog, AppError> {
        let appointments: Vec<Appointment> = self.scoped(principal).list(|_: &Appointment| true).await?;

        let categories: BTreeSet<String> = appointments
            .iter()
            .map(|appointment| appointment.category.clone())
            .collect();
        let labels: BTreeSet<String> = appointments
            .iter()
            .flat_map(|appointment| appointment.labels.iter().cloned())
            .collect();

        Ok(AppointmentCatalog {
            categories: categories.into_iter().collect(),
            labels: labels.into_iter().collect(),
        })
    }

    // ==========================================================================
    // UPDATE / DELETE
    // ==========================================================================

    pub async fn update_appointment(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let scoped = self.scoped(principal);
        let current: Appointment = scoped.find(appointment_id).await?;
        VisibilityResolver::ensure_can_mutate(principal, &current)?;

        let mut updated = current.clone();
        if let Some(patient_id) = request.patient_id {
            updated.patient_id = Some(patient_id);
        }
        if let Some(assigned_to) = request.assigned_to {
            updated.assigned_to = Some(assigned_to);
        }
        if let Some(team) = request.team {
            updated.team = team;
        }
        if let Some(start_date) = request.start_date {
            updated.start_date = start_date;
        }
        if let Some(due_date) = request.due_date {
            updated.due_date = Some(due_date);
        }
        if let Some(status) = request.status {
            updated.status = status;
        }
        if let Some(public) = request.public {
            updated.public = public;
        }
        if let Some(progress) = request.progress {
            updated.progress = progress;
        }
        if let Some(category) = request.category {
            updated.category = self.category_or_default(Some(category));
        }
        if let Some(labels) = request.labels {
            updated.labels = labels;
        }
        if let Some(cost) = request.cost {
            updated.cost = Some(cost);
        }
        if let Some(comments) = request.comments {
            updated.comments = Some(comments);
        }

        self.validate(&updated)?;
        Self::resolve_changed_references(&scoped, &current, &updated).await?;

        let rebooked = updated.assigned_to != current.assigned_to
            || updated.start_date != current.start_date
            || (current.status == AppointmentStatus::Cancelled
                && updated.status != AppointmentStatus::Cancelled);
        if rebooked {
            Self::ensure_slot_free(&scoped, &updated).await?;
        }

        updated.updated_at = Utc::now();
        let saved = scoped.save(&updated).await?;
        info!("Appointment {} updated by user {}", saved.id, principal.id);
        Ok(saved)
    }

    pub async fn delete_appointment(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
    ) -> Result<(), AppError> {
        let scoped = self.scoped(principal);
        let appointment: Appointment = scoped.find(appointment_id).await?;
        VisibilityResolver::ensure_can_mutate(principal, &appointment)?;

        scoped.soft_delete(&appointment).await?;
        info!("Appointment {} deleted by user {}", appointment_id, principal.id);
        Ok(())
    }

    // ==========================================================================
    // CHECKS
    // ==========================================================================

    fn validate(&self, appointment: &Appointment) -> Result<(), AppError> {
        if let Some(due_date) = appointment.due_date {
            if due_date < appointment.start_date {
                return Err(AppError::ValidationError(
                    "Due date must not precede the start date".to_string(),
                ));
            }
        }

        if appointment.progress > self.validation_rules.max_progress {
            return Err(AppError::ValidationError(format!(
                "Progress must be between 0 and {}",
                self.validation_rules.max_progress
            )));
        }

        if appointment.category.chars().count() > self.validation_rules.max_category_length {
            return Err(AppError::ValidationError("Category is too long".to_string()));
        }

        Ok(())
    }

    fn category_or_default(&self, category: Option<String>) -> String {
        match category.map(|category| category.trim().to_string()) {
            Some(category) if !category.is_empty() => category,
            _ => self.validation_rules.default_category.to_string(),
        }
    }

    /// Patient, assignee and team ids must all resolve inside the caller's squad.
    async fn resolve_references(
        scoped: &ScopedStore<'_>,
        appointment: &Appointment,
    ) -> Result<(), AppError> {
        if let Some(patient_id) = appointment.patient_id {
            let _: Patient = scoped.find(patient_id).await?;
        }
        if let Some(assigned_to) = appointment.assigned_to {
            let _: User = scoped.find(assigned_to).await?;
        }
        for member in &appointment.team {
            let _: User = scoped.find(*member).await?;
        }
        Ok(())
    }

    /// Only references the update introduces are resolved. A patient or team member
    /// deleted after booking must not lock the appointment against further edits.
    async fn resolve_changed_references(
        scoped: &ScopedStore<'_>,
        current: &Appointment,
        updated: &Appointment,
    ) -> Result<(), AppError> {
        if let Some(patient_id) = updated.patient_id.filter(|id| current.patient_id != Some(*id)) {
            let _: Patient = scoped.find(patient_id).await?;
        }
        if let Some(assigned_to) = updated.assigned_to.filter(|id| current.assigned_to != Some(*id)) {
            let _: User = scoped.find(assigned_to).await?;
        }
        for member in updated.team.difference(&current.team) {
            let _: User = scoped.find(*member).await?;
        }
        Ok(())
    }

    async fn ensure_slot_free(
        scoped: &ScopedStore<'_>,
        appointment: &Appointment,
    ) -> Result<(), AppError> {
        let Some(assignee) = appointment.assigned_to else {
            return Ok(());
        };
        if !appointment.occupies_slot() {
            return Ok(());
        }

        let holders = AvailabilityService::slot_holders(
            scoped,
            AvailabilityRole::Doctor,
            appointment.start_date,
            Some(appointment.id),
        )
        .await?;

        if holders.contains(&assignee) {
            warn!("User {} already booked at {}", assignee, appointment.start_date);
            return Err(AppError::Conflict(format!(
                "Assignee already has an appointment at {}",
                appointment.start_date
            )));
        }
        Ok(())
    }
}

fn sort_by_start(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
}
