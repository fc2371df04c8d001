use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use shared_models::{Appointment, Doctor, Patient, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Patient,
    Appointment,
    Doctor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "User"),
            EntityKind::Patient => write!(f, "Patient"),
            EntityKind::Appointment => write!(f, "Appointment"),
            EntityKind::Doctor => write!(f, "Doctor"),
        }
    }
}

/// A row the record store knows how to hold.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Whether the tenant scope filter constrains this kind. Doctor profiles carry no
    /// squad of their own and are only ever reached through their (scoped) user.
    const TENANT_SCOPED: bool = true;

    fn id(&self) -> Uuid;
    fn squad_id(&self) -> Option<Uuid>;
    fn is_deleted(&self) -> bool;
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Uuid {
        self.id
    }

    fn squad_id(&self) -> Option<Uuid> {
        Some(self.squad_id)
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Record for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn id(&self) -> Uuid {
        self.id
    }

    fn squad_id(&self) -> Option<Uuid> {
        Some(self.squad_id)
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Record for Appointment {
    const KIND: EntityKind = EntityKind::Appointment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn squad_id(&self) -> Option<Uuid> {
        Some(self.squad_id)
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Record for Doctor {
    const KIND: EntityKind = EntityKind::Doctor;
    const TENANT_SCOPED: bool = false;

    fn id(&self) -> Uuid {
        self.id
    }

    fn squad_id(&self) -> Option<Uuid> {
        None
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
