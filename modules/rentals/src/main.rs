use anyhow::Context;
use event_bus::{EventBus, InMemoryBus};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rentals_rs::config::Config;
use rentals_rs::{routes, InMemoryRentalStore, Metrics, PgRentalStore, RentalProcessor, RentalStore};

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

    let store: Arc<dyn RentalStore> = match config.database_url.as_deref() {
        Some(database_url) if config.store_type == "postgres" => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./db/migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            Arc::new(PgRentalStore::new(pool))
        }
        _ => {
            tracing::info!("Using InMemory rental store");
            Arc::new(InMemoryRentalStore::new())
        }
    };

    let metrics = Metrics::new().context("Failed to register metrics")?;

    // Spawn outbox relay task
    let relay = tokio::spawn(rentals_rs::run_outbox_relay(
        store.clone(),
        bus.clone(),
        metrics.clone(),
        config.outbox_poll_interval(),
    ));

    let processor = Arc::new(RentalProcessor::new(
        store,
        config.payment_queue.clone(),
        metrics.clone(),
    ));
    let consumer =
        rentals_rs::start_rental_consumer(bus.clone(), processor, config.rental_queue.clone())
            .await
            .context("Failed to subscribe to rental queue")?;

    let app = routes::router(metrics);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    tracing::info!("Rentals module listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    consumer.abort();
    relay.abort();
    tracing::info!("Rentals module stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
