use tracing::warn;
use uuid::Uuid;

use shared_models::{Appointment, AppError, Patient, Principal};

use crate::models::{AccessPredicate, VisibilityIntent};

/// Per-record read/write rules. Both checks are pure functions of their inputs.
pub trait AccessControlled {
    const LABEL: &'static str;

    fn record_id(&self) -> Uuid;
    fn can_view(&self, principal: &Principal) -> bool;
    fn can_mutate(&self, principal: &Principal) -> bool;
}

impl AccessControlled for Patient {
    const LABEL: &'static str = "Patient";

    fn record_id(&self) -> Uuid {
        self.id
    }

    // Only the creating user; no team, public or admin exception.
    fn can_view(&self, principal: &Principal) -> bool {
        principal.id == self.user_id
    }

    fn can_mutate(&self, principal: &Principal) -> bool {
        principal.id == self.user_id
    }
}

impl AccessControlled for Appointment {
    const LABEL: &'static str = "Appointment";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn can_view(&self, principal: &Principal) -> bool {
        VisibilityIntent::SharedView.predicate().evaluate(principal, self)
    }

    // Assignees and team members may read but not write. Kept as-is pending product
    // clarification.
    fn can_mutate(&self, principal: &Principal) -> bool {
        AccessPredicate::OwnedByUser.evaluate(principal, self)
    }
}

pub struct VisibilityResolver;

impl VisibilityResolver {
    pub fn can_view<R: AccessControlled>(principal: &Principal, record: &R) -> bool {
        record.can_view(principal)
    }

    pub fn can_mutate<R: AccessControlled>(principal: &Principal, record: &R) -> bool {
        record.can_mutate(principal)
    }

    pub fn ensure_can_view<R: AccessControlled>(principal: &Principal, record: &R) -> Result<(), AppError> {
        if record.can_view(principal) {
            return Ok(());
        }
        warn!("User {} denied read on {} {}", principal.id, R::LABEL, record.record_id());
        Err(AppError::Unauthorized(format!("Not allowed to view this {}", R::LABEL.to_lowercase())))
    }

    pub fn ensure_can_mutate<R: AccessControlled>(principal: &Principal, record: &R) -> Result<(), AppError> {
        if record.can_mutate(principal) {
            return Ok(());
        }
        warn!("User {} denied write on {} {}", principal.id, R::LABEL, record.record_id());
        Err(AppError::Unauthorized(format!("Not allowed to modify this {}", R::LABEL.to_lowercase())))
    }

    /// Keeps the appointments matching `intent` for `principal`, preserving order.
    pub fn filter_appointments(
        principal: &Principal,
        intent: VisibilityIntent,
        appointments: Vec<Appointment>,
    ) -> Vec<Appointment> {
        let predicate = intent.predicate();
        appointments
            .into_iter()
            .filter(|appointment| predicate.evaluate(principal, appointment))
            .collect()
    }
}
