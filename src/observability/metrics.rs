use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub rides_created_total: IntCounter,
    pub ride_transitions_total: IntCounterVec,
    pub confirm_conflicts_total: IntCounter,
    pub online_drivers: IntGauge,
    pub dispatch_deliveries_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let rides_created_total =
            IntCounter::new("rides_created_total", "Total rides created")
                .expect("valid rides_created_total metric");

        let ride_transitions_total = IntCounterVec::new(
            Opts::new(
                "ride_transitions_total",
                "Lifecycle transitions by transition and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid ride_transitions_total metric");

        let confirm_conflicts_total = IntCounter::new(
            "confirm_conflicts_total",
            "Confirms rejected because another driver already took the ride",
        )
        .expect("valid confirm_conflicts_total metric");

        let online_drivers = IntGauge::new("online_drivers", "Drivers currently online")
            .expect("valid online_drivers metric");

        let dispatch_deliveries_total = IntCounterVec::new(
            Opts::new(
                "dispatch_deliveries_total",
                "Relay event deliveries by event and outcome",
            ),
            &["event", "outcome"],
        )
        .expect("valid dispatch_deliveries_total metric");

        registry
            .register(Box::new(rides_created_total.clone()))
            .expect("register rides_created_total");
        registry
            .register(Box::new(ride_transitions_total.clone()))
            .expect("register ride_transitions_total");
        registry
            .register(Box::new(confirm_conflicts_total.clone()))
            .expect("register confirm_conflicts_total");
        registry
            .register(Box::new(online_drivers.clone()))
            .expect("register online_drivers");
        registry
            .register(Box::new(dispatch_deliveries_total.clone()))
            .expect("register dispatch_deliveries_total");

        Self {
            registry,
            rides_created_total,
            ride_transitions_total,
            confirm_conflicts_total,
            online_drivers,
            dispatch_deliveries_total,
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
