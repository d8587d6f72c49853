use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{AddrParseError, SocketAddr};
use tracing_subscriber::EnvFilter;
use wave_config::{EngineConfig, ServiceConfig};

pub const ENGINE_COUNTERS: &[(&str, &str)] = &[
    (
        "wave_evaluations_total",
        "Observer evaluations run, successful or not",
    ),
    (
        "wave_evaluation_failures_total",
        "Observer evaluations that returned an error",
    ),
    (
        "wave_state_changes_total",
        "Observer states published after deduplication",
    ),
    (
        "wave_positions_rejected_total",
        "Position updates refused at the boundary or by source priority",
    ),
    (
        "wave_containment_cache_hits_total",
        "Area containment answers served from the single-slot cache",
    ),
    (
        "wave_circuit_breaker_trips_total",
        "Times an observer suspended evaluation after repeated failures",
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

impl From<&ServiceConfig> for ObservabilityConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            environment: config.environment.to_string(),
            log_level: config.log_level.clone(),
            metrics_addr: config.metrics_addr.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObservabilityHandle {
    pub service_name: String,
    pub environment: String,
    pub metrics_endpoint: Option<SocketAddr>,
}

impl ObservabilityHandle {
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_endpoint.is_some()
    }
}

pub fn init(config: &ObservabilityConfig) -> ObservabilityHandle {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let metrics_endpoint = match metrics_endpoint(config) {
        Ok(Some(addr)) => install_exporter(config, addr).then_some(addr),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(
                service = %config.service_name,
                error = %err,
                "Invalid WAVE_METRICS_ADDR value"
            );
            None
        }
    };
    for (name, description) in ENGINE_COUNTERS {
        metrics::describe_counter!(*name, *description);
    }

    ObservabilityHandle {
        service_name: config.service_name.clone(),
        environment: config.environment.clone(),
        metrics_endpoint,
    }
}

/// Startup line carrying the engine tunables, so a log alone tells how an
/// observer was paced.
pub fn log_startup(handle: &ObservabilityHandle, engine: &EngineConfig) {
    tracing::info!(
        service = %handle.service_name,
        environment = %handle.environment,
        metrics_endpoint = ?handle.metrics_endpoint,
        tick_ms = engine.tick_interval.as_millis() as u64,
        debounce_ms = engine.position_debounce.as_millis() as u64,
        hit_lead_ms = engine.hit_lead.as_millis() as u64,
        breaker_threshold = engine.breaker_threshold,
        breaker_cooldown_ms = engine.breaker_cooldown.as_millis() as u64,
        "wave service starting"
    );
}

fn metrics_endpoint(config: &ObservabilityConfig) -> Result<Option<SocketAddr>, AddrParseError> {
    config
        .metrics_addr
        .as_deref()
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::parse)
        .transpose()
}

fn install_exporter(config: &ObservabilityConfig, addr: SocketAddr) -> bool {
    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", config.service_name.clone())
        .add_global_label("environment", config.environment.clone());

    match builder.install() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                service = %config.service_name,
                error = %err,
                "Failed to initialize Prometheus exporter"
            );
            false
        }
    }
}
