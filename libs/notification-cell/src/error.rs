use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("No channel for {0}")]
    NoChannel(String),

    #[error("No live subscribers on {0}")]
    NoSubscribers(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
