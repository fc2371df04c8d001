use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::RecordStore;
use shared_models::EventOutbox;

/// Shared handler state: configuration, the record store and the event outbox.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    pub outbox: EventOutbox,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>, outbox: EventOutbox) -> Self {
        Self {
            config: Arc::new(config),
            store,
            outbox,
        }
    }
}
