use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub rentals_messages_total: IntCounterVec,
    pub rentals_recorded_total: IntCounter,
    pub outbox_published_total: IntCounter,
    pub outbox_publish_failures_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let rentals_messages_total = IntCounterVec::new(
            Opts::new("rentals_messages_total", "Rental-queue messages settled"),
            &["disposition"], // completed|dead_lettered
        )?;

        let rentals_recorded_total = IntCounter::new(
            "rentals_recorded_total",
            "Rentals written together with their outbox message",
        )?;

        let outbox_published_total = IntCounter::new(
            "rentals_outbox_published_total",
            "Outbox messages relayed to the payment queue",
        )?;

        let outbox_publish_failures_total = IntCounter::new(
            "rentals_outbox_publish_failures_total",
            "Relay attempts that left an outbox message pending",
        )?;

        registry.register(Box::new(rentals_messages_total.clone()))?;
        registry.register(Box::new(rentals_recorded_total.clone()))?;
        registry.register(Box::new(outbox_published_total.clone()))?;
        registry.register(Box::new(outbox_publish_failures_total.clone()))?;

        Ok(Self {
            registry,
            rentals_messages_total,
            rentals_recorded_total,
            outbox_published_total,
            outbox_publish_failures_total,
        })
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&mf, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}
