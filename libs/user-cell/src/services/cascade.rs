//! User deletion and the appointment cascade that precedes it.
//!
//! A user's appointments are found through the role-specific relation: patients through
//! the patient profiles they own (`appointment.patient_id`), everyone else through
//! `appointment.assigned_to`. Every appointment is soft-deleted individually before the
//! user is. Any failure after the first write leaves the tenant inconsistent and is
//! reported as `CascadeIncomplete`.

use std::collections::HashSet;

use tracing::{error, info, warn};
use uuid::Uuid;

use shared_database::ScopedStore;
use shared_models::{AppError, Appointment, Patient, Principal, User, UserType};

use crate::models::CascadeReport;
use crate::services::directory::UserService;

impl UserService {
    pub async fn delete_user(&self, principal: &Principal, user_id: Uuid) -> Result<CascadeReport, AppError> {
        if !principal.is_admin() && principal.id != user_id {
            warn!("User {} denied deletion of user {}", principal.id, user_id);
            return Err(AppError::Unauthorized("Not allowed to delete this user".to_string()));
        }

        let scoped = self.scoped(principal);
        let user: User = scoped.find(user_id).await?;
        let appointments = role_appointments(&scoped, &user).await?;
        let total = appointments.len();

        for (done, appointment) in appointments.iter().enumerate() {
            scoped.soft_delete(appointment).await.map_err(|e| {
                error!(
                    "Cascade for user {} stopped after {}/{} appointments: {}",
                    user_id, done, total, e
                );
                AppError::CascadeIncomplete(format!(
                    "Deleted {} of {} appointments for user {}: {}",
                    done, total, user_id, e
                ))
            })?;
        }

        scoped.soft_delete(&user).await.map_err(|e| {
            error!("Appointments of user {} deleted but the user was not: {}", user_id, e);
            AppError::CascadeIncomplete(format!("User {} not deleted: {}", user_id, e))
        })?;

        info!("User {} deleted with {} appointments", user_id, total);
        Ok(CascadeReport {
            user_id,
            appointments_deleted: total,
        })
    }
}

/// Live appointments reached through the user's role relation.
pub async fn role_appointments(scoped: &ScopedStore<'_>, user: &User) -> Result<Vec<Appointment>, AppError> {
    match user.user_type {
        UserType::Patient => {
            let profiles: Vec<Patient> = scoped
                .list_including_deleted(|patient: &Patient| patient.user_id == user.id)
                .await?;
            let profile_ids: HashSet<Uuid> = profiles.iter().map(|patient| patient.id).collect();

            scoped
                .list(|appointment: &Appointment| {
                    appointment
                        .patient_id
                        .is_some_and(|patient_id| profile_ids.contains(&patient_id))
                })
                .await
        }
        UserType::Doctor | UserType::Admin => {
            scoped
                .list(|appointment: &Appointment| appointment.assigned_to == Some(user.id))
                .await
        }
    }
}
