use anyhow::Context;
use event_bus::{EventBus, InMemoryBus};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rental_intake::config::Config;
use rental_intake::{router, AppState, Metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Create event bus
    let bus: Arc<dyn EventBus> = match config.bus_type.as_str() {
        "nats" => {
            tracing::info!("Connecting to NATS at {}", config.nats_url);
            let client = async_nats::connect(&config.nats_url)
                .await
                .context("Failed to connect to NATS")?;
            Arc::new(event_bus::NatsBus::new(client))
        }
        _ => {
            tracing::info!("Using InMemory event bus");
            Arc::new(InMemoryBus::new())
        }
    };

    let state = Arc::new(AppState {
        bus,
        rental_queue: config.rental_queue.clone(),
        metrics: Metrics::new().context("Failed to register metrics")?,
    });
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    tracing::info!(queue = %config.rental_queue, "Rental intake listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("Server failed")?;

    Ok(())
}
