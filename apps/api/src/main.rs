use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use notification_cell::{spawn_dispatcher, SquadBroadcaster};
use shared_config::AppConfig;
use shared_database::MemoryStore;
use shared_models::EventOutbox;
use shared_utils::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Squad Clinic API server");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_configured() {
        warn!("JWT_SECRET is empty; every authenticated route will reject requests");
    }

    // Patient events flow through the outbox into per-squad broadcast channels,
    // which clients follow on GET /events
    let broadcaster = Arc::new(SquadBroadcaster::new(config.notification_channel_capacity));
    let outbox = if config.notification_queue_enabled {
        let (outbox, receiver) = EventOutbox::channel();
        spawn_dispatcher(receiver, broadcaster.clone());
        outbox
    } else {
        info!("Notification queue disabled");
        EventOutbox::disabled()
    };

    let port = config.server_port;
    let state = AppState::new(config, Arc::new(MemoryStore::new()), outbox);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state, broadcaster)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
