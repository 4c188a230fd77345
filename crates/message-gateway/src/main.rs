//! Message Gateway - Entry point.

use anyhow::Context;
use message_gateway::{
    api::{create_router, AppState},
    config::Config,
    Dispatcher, FaultReporter, SessionSupervisor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whatsapp_client::{event_channel, BridgeSession, MessagingSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level);

    info!("Starting Message Gateway");

    let normalizer = config.normalizer()?;

    // Initialize WhatsApp bridge session
    let (event_tx, event_rx) = event_channel();
    let bridge = BridgeSession::new(
        &config.whatsapp.bridge_url,
        config.whatsapp.request_timeout,
        config.whatsapp.poll_timeout,
        event_tx,
    )
    .context("Failed to create WhatsApp bridge client")?;

    if bridge.health_check().await {
        info!("WhatsApp bridge reachable at {}", bridge.base_url());
    } else {
        warn!(
            "WhatsApp bridge not reachable at {} - sends will fail until it is",
            bridge.base_url()
        );
    }

    let session: Arc<dyn MessagingSession> = Arc::new(bridge);

    // Start session supervision
    let supervisor = SessionSupervisor::new(session.clone(), event_rx);
    let session_state = supervisor.subscribe();
    let supervisor_task = supervisor.spawn();

    // Create application state
    let dispatcher = Dispatcher::new(
        session.clone(),
        normalizer,
        session_state.clone(),
        config.delivery_policy(),
    );
    let faults = FaultReporter::for_environment(&config.node_env);
    let state = AppState::new(dispatcher, session_state, faults);

    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        "Server is running on http://localhost:{} [{}]",
        config.port, config.node_env
    );

    // Run server
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Shutting down...");
    supervisor_task.abort();
    if let Err(e) = session.destroy().await {
        warn!("Failed to destroy WhatsApp session: {}", e);
    }

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
