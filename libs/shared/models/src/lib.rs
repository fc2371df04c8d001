pub mod auth;
pub mod entities;
pub mod error;
pub mod events;
pub mod outbox;

pub use auth::{Principal, UserType};
pub use entities::{Appointment, AppointmentStatus, Doctor, Patient, User};
pub use error::AppError;
pub use events::{NotificationEmitter, PatientAction, PatientEvent};
pub use outbox::{EventOutbox, OutboxError, OutboxReceiver};
