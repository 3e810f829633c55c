//! Metrics collection and exposition.
//!
//! # Metrics
//! - `geo_requests_total` (counter): requests by outcome and status
//! - `geo_request_duration_seconds` (histogram): handler latency by outcome
//!
//! Recording without an installed exporter is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one request handled by the geo handler.
pub fn record_request(outcome: &'static str, status: u16, start_time: Instant) {
    record_outcome(outcome, status);
    metrics::histogram!("geo_request_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}

/// Count a request with no handler start time (panics, timeouts).
pub fn record_outcome(outcome: &'static str, status: u16) {
    metrics::counter!(
        "geo_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Recorder that remembers which metric names were touched.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct KeyLog(std::sync::Mutex<Vec<String>>);

#[cfg(test)]
impl KeyLog {
    pub(crate) fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl metrics::Recorder for KeyLog {
    fn describe_counter(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }
    fn describe_gauge(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }
    fn describe_histogram(
        &self,
        _: metrics::KeyName,
        _: Option<metrics::Unit>,
        _: metrics::SharedString,
    ) {
    }

    fn register_counter(&self, key: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Counter {
        self.0.lock().unwrap().push(key.name().to_string());
        metrics::Counter::noop()
    }

    fn register_gauge(&self, key: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Gauge {
        self.0.lock().unwrap().push(key.name().to_string());
        metrics::Gauge::noop()
    }

    fn register_histogram(
        &self,
        key: &metrics::Key,
        _: &metrics::Metadata<'_>,
    ) -> metrics::Histogram {
        self.0.lock().unwrap().push(key.name().to_string());
        metrics::Histogram::noop()
    }
}
