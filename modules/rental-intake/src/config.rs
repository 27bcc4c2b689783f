use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub bus_type: String,
    pub nats_url: String,
    pub rental_queue: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let bus_type = env::var("BUS_TYPE")
            .unwrap_or_else(|_| "inmemory".to_string())
            .to_lowercase();
        if !matches!(bus_type.as_str(), "inmemory" | "nats") {
            return Err(format!("Invalid BUS_TYPE: {}. Must be 'inmemory' or 'nats'", bus_type).into());
        }

        Ok(Self {
            bus_type,
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            rental_queue: env::var("RENTAL_QUEUE")
                .unwrap_or_else(|_| "fila-locacao-auto".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
        })
    }
}
