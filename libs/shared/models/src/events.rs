use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::entities::Patient;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatientAction {
    Create,
    Update,
    Delete,
}

/// Patient mutation broadcast to everyone in the patient's squad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientEvent {
    pub squad_id: Uuid,
    pub action: PatientAction,
    pub patient: Patient,
}

impl PatientEvent {
    pub const NAME: &'static str = "patient-event";

    pub fn new(action: PatientAction, patient: Patient) -> Self {
        Self {
            squad_id: patient.squad_id,
            action,
            patient,
        }
    }

    pub fn channel(&self) -> String {
        squad_channel(self.squad_id)
    }

    pub fn payload(&self) -> Value {
        json!({
            "type": self.action,
            "patient": self.patient,
        })
    }
}

pub fn squad_channel(squad_id: Uuid) -> String {
    format!("squad.{}", squad_id)
}

/// Delivery side of domain events. Delivery is at-most-once: failures are the
/// emitter's to log, never reported back to the mutation that produced the event.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn publish(&self, channel: &str, event_name: &str, payload: Value);
}
