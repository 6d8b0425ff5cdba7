use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub help_requests_total: IntCounterVec,
    pub accept_attempts_total: IntCounterVec,
    pub accept_latency_seconds: HistogramVec,
    pub pending_requests: IntGauge,
    pub location_updates_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let help_requests_total = IntCounterVec::new(
            Opts::new("help_requests_total", "Help request lifecycle events by outcome"),
            &["outcome"],
        )
        .expect("valid help_requests_total metric");

        let accept_attempts_total = IntCounterVec::new(
            Opts::new("accept_attempts_total", "Volunteer accept attempts by outcome"),
            &["outcome"],
        )
        .expect("valid accept_attempts_total metric");

        let accept_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "accept_latency_seconds",
                "Latency of accept processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid accept_latency_seconds metric");

        let pending_requests =
            IntGauge::new("pending_requests", "Help requests currently waiting for a volunteer")
                .expect("valid pending_requests metric");

        let location_updates_total = IntCounterVec::new(
            Opts::new(
                "location_updates_total",
                "Location observations by effect on the current position",
            ),
            &["result"],
        )
        .expect("valid location_updates_total metric");

        registry
            .register(Box::new(help_requests_total.clone()))
            .expect("register help_requests_total");
        registry
            .register(Box::new(accept_attempts_total.clone()))
            .expect("register accept_attempts_total");
        registry
            .register(Box::new(accept_latency_seconds.clone()))
            .expect("register accept_latency_seconds");
        registry
            .register(Box::new(pending_requests.clone()))
            .expect("register pending_requests");
        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");

        Self {
            registry,
            help_requests_total,
            accept_attempts_total,
            accept_latency_seconds,
            pending_requests,
            location_updates_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
