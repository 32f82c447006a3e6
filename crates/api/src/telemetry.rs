//! Logging and metrics setup

use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging. Unknown levels fall back to `info`.
pub fn init_logging(level: &str, json: bool) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if result.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Install the global Prometheus recorder
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Count a successful classification and its pipeline latency
pub fn record_success(latency: Duration) {
    counter!("classifier_requests_total", "outcome" => "success").increment(1);
    histogram!("classifier_inference_seconds").record(latency.as_secs_f64());
}

/// Count a failed request by error kind
pub fn record_failure(kind: &'static str) {
    counter!("classifier_requests_total", "outcome" => "failure").increment(1);
    counter!("classifier_failures_total", "kind" => kind).increment(1);
}
