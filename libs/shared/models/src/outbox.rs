use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::PatientEvent;

pub type OutboxReceiver = mpsc::UnboundedReceiver<PatientEvent>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OutboxError {
    #[error("Event outbox is closed")]
    Closed,

    #[error("Event outbox is disabled")]
    Disabled,
}

/// Outbound domain-event queue.
///
/// Mutating services enqueue here and move on; delivery happens on whatever task
/// drains the receiver, so an emitter failure can never roll back or delay the mutation.
#[derive(Clone)]
pub struct EventOutbox {
    sender: Option<mpsc::UnboundedSender<PatientEvent>>,
}

impl EventOutbox {
    pub fn channel() -> (Self, OutboxReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender: Some(sender) }, receiver)
    }

    /// An outbox that drops every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn try_enqueue(&self, event: PatientEvent) -> Result<(), OutboxError> {
        let sender = self.sender.as_ref().ok_or(OutboxError::Disabled)?;
        sender.send(event).map_err(|_| OutboxError::Closed)
    }

    /// Fire-and-forget enqueue.
    pub fn enqueue(&self, event: PatientEvent) {
        let channel = event.channel();
        match self.try_enqueue(event) {
            Ok(()) => debug!("Queued {} for {}", PatientEvent::NAME, channel),
            Err(OutboxError::Disabled) => {
                debug!("Outbox disabled, dropping event for {}", channel)
            }
            Err(e) => warn!("Dropping event for {}: {}", channel, e),
        }
    }
}
