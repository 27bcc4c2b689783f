use anyhow::Context;
use event_bus::{EventBus, InMemoryBus};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use payments_rs::config::Config;
use payments_rs::{
    routes, InMemoryPaymentSink, Metrics, NotificationPublisher, PaymentProcessor, PaymentSink,
    PgPaymentSink, RandomStatusDecider, SeededStatusDecider, StatusDecider,
};

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

    // Document sink
    let sink: Arc<dyn PaymentSink> = match config.database_url.as_deref() {
        Some(database_url) if config.sink_type == "postgres" => {
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

            Arc::new(PgPaymentSink::new(pool))
        }
        _ => {
            tracing::info!("Using InMemory payment sink");
            Arc::new(InMemoryPaymentSink::new())
        }
    };

    let decider: Arc<dyn StatusDecider> = match config.status_seed {
        Some(seed) => {
            tracing::info!(seed, "Using seeded status decider");
            Arc::new(SeededStatusDecider::new(seed))
        }
        None => Arc::new(RandomStatusDecider),
    };

    let metrics = Metrics::new().context("Failed to register metrics")?;
    let notifier = NotificationPublisher::new(
        bus.clone(),
        config.notification_queue.clone(),
        config.notification_timeout(),
    );
    let processor = Arc::new(PaymentProcessor::new(
        decider,
        sink,
        notifier,
        metrics.clone(),
    ));

    let consumer = payments_rs::start_payment_consumer(
        bus.clone(),
        processor,
        config.payment_queue.clone(),
    )
    .await
    .context("Failed to subscribe to payment queue")?;

    let app = routes::router(metrics);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    tracing::info!("Payments module listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    consumer.abort();
    tracing::info!("Payments module stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
