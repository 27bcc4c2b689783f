use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub payments_messages_total: IntCounterVec,
    pub payments_status_total: IntCounterVec,
    pub payments_notifications_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let payments_messages_total = IntCounterVec::new(
            Opts::new("payments_messages_total", "Payment-queue messages settled"),
            &["disposition"], // completed|dead_lettered
        )?;

        let payments_status_total = IntCounterVec::new(
            Opts::new("payments_status_total", "Payment statuses assigned"),
            &["status"],
        )?;

        let payments_notifications_total = IntCounterVec::new(
            Opts::new(
                "payments_notifications_total",
                "Approval notifications attempted",
            ),
            &["outcome"], // sent|failed
        )?;

        registry.register(Box::new(payments_messages_total.clone()))?;
        registry.register(Box::new(payments_status_total.clone()))?;
        registry.register(Box::new(payments_notifications_total.clone()))?;

        Ok(Self {
            registry,
            payments_messages_total,
            payments_status_total,
            payments_notifications_total,
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
