//! Parsers turning probe output into metric samples.
//!
//! Every parser is a pure function over a [`ProbeResult`](crate::probe::ProbeResult).
//! Parsers never fail: malformed lines are skipped and a failed probe becomes
//! a down-status or diagnostic sample. Only the probe outcome decides whether
//! a subsystem is reported down.

pub mod ipsec;
pub mod netdev;
pub mod ping;
pub mod wireguard;

use crate::model::{families, MetricSample};
use crate::probe::ProbeResult;

/// Component label values used in `vpn_exporter_error`.
pub mod component {
    /// WireGuard peer dump.
    pub const WIREGUARD: &str = "wireguard";
    /// IKE daemon status.
    pub const IPSEC: &str = "ipsec";
    /// Kernel interface table.
    pub const NETWORK: &str = "network";
    /// Ping targets. Only used in self-metrics.
    pub const LATENCY: &str = "latency";
}

/// Builds the diagnostic sample for a failed probe, `None` on success.
pub fn error_sample(component: &str, result: &ProbeResult) -> Option<MetricSample> {
    let label = result.error_label()?;
    Some(
        families::EXPORTER_ERROR.sample([("component", component), ("error", label)], 1.0),
    )
}

/// Parses a counter field, rejecting anything that is not an unsigned integer.
pub(crate) fn parse_counter(field: &str) -> Option<f64> {
    field.trim().parse::<u64>().ok().map(|v| v as f64)
}
