use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use shared_models::{NotificationEmitter, OutboxReceiver, PatientEvent};

/// Drains the outbox into the emitter until every `EventOutbox` handle is dropped.
pub async fn run_dispatcher(mut receiver: OutboxReceiver, emitter: Arc<dyn NotificationEmitter>) {
    info!("Event outbox dispatcher started");
    while let Some(event) = receiver.recv().await {
        emitter
            .publish(&event.channel(), PatientEvent::NAME, event.payload())
            .await;
    }
    info!("Event outbox dispatcher stopped");
}

pub fn spawn_dispatcher(
    receiver: OutboxReceiver,
    emitter: Arc<dyn NotificationEmitter>,
) -> JoinHandle<()> {
    tokio::spawn(run_dispatcher(receiver, emitter))
}
