use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub requests_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("rental_intake_requests_total", "Rental intake requests by result"),
            &["result"], // queued|invalid|failed
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
        })
    }

    pub fn record(&self, result: &str) {
        self.requests_total.with_label_values(&[result]).inc();
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&mf, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}
