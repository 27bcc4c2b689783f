use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub bus_type: String,
    pub nats_url: String,
    /// `postgres` or `inmemory`
    pub store_type: String,
    pub database_url: Option<String>,

    pub rental_queue: String,
    pub payment_queue: String,

    pub host: String,
    pub port: u16,

    pub outbox_poll_interval_ms: u64,
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

        let store_type = var("STORE_TYPE")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase();
        if !matches!(store_type.as_str(), "postgres" | "inmemory") {
            return Err(format!("Invalid STORE_TYPE: {}. Must be 'postgres' or 'inmemory'", store_type).into());
        }

        let database_url = var("DATABASE_URL");
        if store_type == "postgres" && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORE_TYPE=postgres".into());
        }

        let outbox_poll_interval_ms: u64 = var("OUTBOX_POLL_INTERVAL_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()?;
        if outbox_poll_interval_ms == 0 {
            return Err("OUTBOX_POLL_INTERVAL_MS must be greater than zero".into());
        }

        Ok(Self {
            bus_type,
            nats_url: var("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string()),
            store_type,
            database_url,

            rental_queue: var("RENTAL_QUEUE").unwrap_or_else(|| "fila-locacao-auto".to_string()),
            payment_queue: var("PAYMENT_QUEUE").unwrap_or_else(|| "payment-queue".to_string()),

            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT").unwrap_or_else(|| "8087".to_string()).parse()?,

            outbox_poll_interval_ms,
        })
    }

    pub fn outbox_poll_interval(&self) -> Duration {
        Duration::from_millis(self.outbox_poll_interval_ms)
    }
}
