//! `ping` summary parser.

use crate::config::LatencyTarget;
use crate::model::{families, MetricSample};
use crate::probe::ProbeResult;
use regex::Regex;
use std::sync::OnceLock;

/// Matches the average in `rtt min/avg/max/mdev = 0.412/0.538/0.701/0.118 ms`
/// (iputils) and `round-trip min/avg/max/stddev = ...` (BusyBox, BSD).
fn average_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"avg[^=]+=\s*[\d.]+/([\d.]+)/").expect("valid rtt pattern"))
}

/// Extracts the average round-trip time in milliseconds.
pub fn average_rtt(text: &str) -> Option<f64> {
    average_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Converts ping output for one target into samples.
///
/// An unreachable target is routine, so failures only set
/// `vpn_latency_probe_up` to 0 and never produce an error sample.
pub fn parse(result: &ProbeResult, target: &LatencyTarget) -> Vec<MetricSample> {
    let labels = [
        ("vpn_type", target.vpn_type.as_str()),
        ("target", target.address.as_str()),
    ];

    let Some(output) = result.output() else {
        return vec![families::LATENCY_PROBE_UP.sample(labels, 0.0)];
    };

    let mut samples = vec![families::LATENCY_PROBE_UP.sample(labels, 1.0)];
    if let Some(avg) = average_rtt(output) {
        samples.push(families::LATENCY_MS.sample(labels, avg));
    }
    samples
}
