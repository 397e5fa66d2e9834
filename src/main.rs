use events::EventPublisher;
use log::*;
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;
use ws::{Hub, WsDomainEventHandler};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting up rest_ws...");

    if config.jwt_secret().is_none() {
        warn!("No JWT secret configured: login and the /api/v1 routes will fail until JWT_SECRET is set");
    }

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let hub = Arc::new(Hub::new(config.ws_outbound_queue_capacity));
    let event_publisher = Arc::new(
        EventPublisher::new().with_handler(Arc::new(WsDomainEventHandler::new(hub.clone()))),
    );

    let app_state = AppState::new(config, &db, event_publisher, Arc::clone(&hub));

    if let Err(e) = web::init_server(app_state).await {
        error!("Server exited with an error: {e}");
        hub.shutdown();
        std::process::exit(1);
    }

    // Idempotent; the shutdown signal has normally closed everything already
    hub.shutdown();
    info!("rest_ws stopped");
}
