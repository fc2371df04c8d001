use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub server_port: u16,
    pub notification_channel_capacity: usize,
    pub notification_queue_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            server_port: 3000,
            notification_channel_capacity: 100,
            notification_queue_enabled: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, authenticated routes will reject every token");
                    String::new()
                }),
            server_port: parse_or_default("SERVER_PORT", defaults.server_port),
            notification_channel_capacity: parse_or_default(
                "NOTIFICATION_CHANNEL_CAPACITY",
                defaults.notification_channel_capacity,
            ),
            notification_queue_enabled: parse_or_default(
                "NOTIFICATION_QUEUE_ENABLED",
                defaults.notification_queue_enabled,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}
