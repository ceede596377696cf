//! Exporter self-instrumentation.
//!
//! Unlike VPN samples, these live for the whole process so failure counts
//! accumulate across scrapes.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during self-instrumentation.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A metric could not be created, registered or encoded.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus registry describing the exporter itself.
pub struct ExporterStats {
    registry: Registry,
    scrapes_total: IntCounter,
    probe_failures_total: IntCounterVec,
    scrape_duration: Histogram,
    last_scrape_timestamp: IntGauge,
}

impl ExporterStats {
    /// Creates the registry with all exporter metrics registered.
    pub fn new() -> Result<Self, StatsError> {
        let registry = Registry::new();

        let scrapes_total = IntCounter::new(
            "vpn_exporter_scrapes_total",
            "Total number of metric scrapes served",
        )?;
        let probe_failures_total = IntCounterVec::new(
            Opts::new(
                "vpn_exporter_probe_failures_total",
                "Total number of failed probe runs by component and reason",
            ),
            &["component", "reason"],
        )?;
        let scrape_duration = Histogram::with_opts(
            HistogramOpts::new(
                "vpn_exporter_scrape_duration_seconds",
                "Time spent collecting one snapshot",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
        )?;
        let last_scrape_timestamp = IntGauge::new(
            "vpn_exporter_last_scrape_timestamp_seconds",
            "Unix time of the most recent scrape",
        )?;

        registry.register(Box::new(scrapes_total.clone()))?;
        registry.register(Box::new(probe_failures_total.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(last_scrape_timestamp.clone()))?;

        Ok(Self {
            registry,
            scrapes_total,
            probe_failures_total,
            scrape_duration,
            last_scrape_timestamp,
        })
    }

    /// Counts a failed probe run.
    pub fn record_failure(&self, component: &str, reason: &str) {
        self.probe_failures_total
            .with_label_values(&[component, reason])
            .inc();
    }

    /// Records a finished scrape.
    pub fn observe_scrape(&self, elapsed: Duration) {
        self.scrapes_total.inc();
        self.scrape_duration.observe(elapsed.as_secs_f64());
        self.last_scrape_timestamp
            .set(chrono::Utc::now().timestamp());
    }

    /// Number of failures recorded for a component and reason.
    pub fn failures(&self, component: &str, reason: &str) -> u64 {
        self.probe_failures_total
            .with_label_values(&[component, reason])
            .get()
    }

    /// Number of scrapes served.
    pub fn scrapes(&self) -> u64 {
        self.scrapes_total.get()
    }

    /// Encodes all exporter metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, StatsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_creation() {
        let stats = ExporterStats::new();
        assert!(stats.is_ok());
    }

    #[test]
    fn test_record_failure() {
        let stats = ExporterStats::new().unwrap();
        stats.record_failure("wireguard", "not_found");
        stats.record_failure("wireguard", "not_found");
        stats.record_failure("ipsec", "timeout");

        assert_eq!(stats.failures("wireguard", "not_found"), 2);
        assert_eq!(stats.failures("ipsec", "timeout"), 1);

        let output = stats.encode().unwrap();
        assert!(output.contains(
            "vpn_exporter_probe_failures_total{component=\"wireguard\",reason=\"not_found\"} 2"
        ));
    }

    #[test]
    fn test_observe_scrape() {
        let stats = ExporterStats::new().unwrap();
        stats.observe_scrape(Duration::from_millis(20));

        assert_eq!(stats.scrapes(), 1);
        let output = stats.encode().unwrap();
        assert!(output.contains("vpn_exporter_scrapes_total 1"));
        assert!(output.contains("vpn_exporter_scrape_duration_seconds_count 1"));
        assert!(output.contains("vpn_exporter_last_scrape_timestamp_seconds"));
    }
}
