use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::events::{squad_channel, NotificationEmitter};

use crate::error::NotificationError;
use crate::models::BroadcastMessage;

pub type SquadSender = broadcast::Sender<String>;
pub type SquadReceiver = broadcast::Receiver<String>;

/// One broadcast channel per `squad.<id>`.
pub struct SquadBroadcaster {
    channels: Arc<RwLock<HashMap<String, SquadSender>>>,
    capacity: usize,
}

impl SquadBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, squad_id: Uuid) -> SquadReceiver {
        let channel = squad_channel(squad_id);
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        debug!("New subscriber on {}", channel);
        sender.subscribe()
    }

    pub async fn remove_channel(&self, squad_id: Uuid) {
        let channel = squad_channel(squad_id);
        let mut channels = self.channels.write().await;
        channels.remove(&channel);
        debug!("Removed channel {}", channel);
    }

    pub async fn active_channels(&self) -> Vec<String> {
        let channels = self.channels.read().await;
        channels.keys().cloned().collect()
    }

    /// Sends one message to a squad channel and reports how many subscribers got it.
    pub async fn send(
        &self,
        channel: &str,
        event_name: &str,
        payload: Value,
    ) -> Result<usize, NotificationError> {
        let message = BroadcastMessage {
            channel: channel.to_string(),
            event: event_name.to_string(),
            payload,
            sent_at: Utc::now(),
        };
        let serialized = serde_json::to_string(&message)?;

        let channels = self.channels.read().await;
        let sender = channels
            .get(channel)
            .ok_or_else(|| NotificationError::NoChannel(channel.to_string()))?;
        sender
            .send(serialized)
            .map_err(|_| NotificationError::NoSubscribers(channel.to_string()))
    }
}

#[async_trait]
impl NotificationEmitter for SquadBroadcaster {
    async fn publish(&self, channel: &str, event_name: &str, payload: Value) {
        match self.send(channel, event_name, payload).await {
            Ok(receivers) => debug!("Sent {} on {} to {} subscribers", event_name, channel, receivers),
            Err(e @ NotificationError::SerializationError(_)) => {
                warn!("Dropping {} on {}: {}", event_name, channel, e)
            }
            Err(e) => debug!("Dropping {}: {}", event_name, e),
        }
    }
}
