use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// `inmemory` or `nats`
    pub bus_type: String,
    pub nats_url: String,
    /// `postgres` or `inmemory`
    pub sink_type: String,
    pub database_url: Option<String>,

    pub payment_queue: String,
    pub notification_queue: String,

    pub host: String,
    pub port: u16,

    pub notification_timeout_ms: u64,
    /// Switches the decision policy to a reproducible seeded draw
    pub status_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(var: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bus_type = var("BUS_TYPE")
            .unwrap_or_else(|| "inmemory".to_string())
            .to_lowercase();
        if !matches!(bus_type.as_str(), "inmemory" | "nats") {
            return Err(format!("Invalid BUS_TYPE: {}. Must be 'inmemory' or 'nats'", bus_type).into());
        }

        let sink_type = var("SINK_TYPE")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase();
        if !matches!(sink_type.as_str(), "postgres" | "inmemory") {
            return Err(format!("Invalid SINK_TYPE: {}. Must be 'postgres' or 'inmemory'", sink_type).into());
        }

        let database_url = var("DATABASE_URL");
        if sink_type == "postgres" && database_url.is_none() {
            return Err("DATABASE_URL must be set when SINK_TYPE=postgres".into());
        }

        let status_seed = match var("STATUS_SEED") {
            Some(seed) => Some(seed.parse()?),
            None => None,
        };

        Ok(Self {
            bus_type,
            nats_url: var("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string()),
            sink_type,
            database_url,

            payment_queue: var("PAYMENT_QUEUE").unwrap_or_else(|| "payment-queue".to_string()),
            notification_queue: var("NOTIFICATION_QUEUE")
                .unwrap_or_else(|| "notification-queue".to_string()),

            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT").unwrap_or_else(|| "8088".to_string()).parse()?,

            notification_timeout_ms: var("NOTIFICATION_TIMEOUT_MS")
                .unwrap_or_else(|| "5000".to_string())
                .parse()?,
            status_seed,
        })
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }
}
