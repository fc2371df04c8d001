use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use shared_models::Principal;

use crate::services::SquadBroadcaster;

/// Streams every message sent to the caller's own squad channel.
///
/// Each message is a JSON `BroadcastMessage`. A subscriber that falls behind
/// skips the messages it missed and keeps going.
pub async fn stream_squad_events(
    State(broadcaster): State<Arc<SquadBroadcaster>>,
    Extension(principal): Extension<Principal>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("User {} subscribed to squad {} events", principal.id, principal.squad_id);
    let receiver = broadcaster.subscribe(principal.squad_id).await;

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(message) => return Some((Ok(Event::default().data(message)), receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Squad subscriber lagged, skipped {} messages", skipped)
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
