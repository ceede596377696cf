//! `ipsec statusall` parser.
//!
//! The daemon's status text is free-form, so only a few stable markers are
//! used: `ESTABLISHED` per IKE SA, `INSTALLED` per CHILD SA and the
//! `<n> bytes_i` / `<n> bytes_o` traffic counters.

use super::{component, error_sample};
use crate::model::{families, MetricSample};
use crate::probe::ProbeResult;
use regex::Regex;
use std::sync::OnceLock;

const VPN_TYPE: &str = "ipsec";

fn bytes_in_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s+bytes_i").expect("valid bytes_i pattern"))
}

fn bytes_out_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s+bytes_o").expect("valid bytes_o pattern"))
}

/// Counts extracted from the status text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpsecStatus {
    /// `ESTABLISHED` occurrences.
    pub established: usize,
    /// `INSTALLED` occurrences.
    pub installed: usize,
    /// First `bytes_i` value.
    pub rx_bytes: Option<f64>,
    /// First `bytes_o` value.
    pub tx_bytes: Option<f64>,
}

impl IpsecStatus {
    /// Scans status text. Only the first byte counters are reported.
    pub fn scan(text: &str) -> Self {
        Self {
            established: text.matches("ESTABLISHED").count(),
            installed: text.matches("INSTALLED").count(),
            rx_bytes: first_number(bytes_in_pattern(), text),
            tx_bytes: first_number(bytes_out_pattern(), text),
        }
    }
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|v| v as f64)
}

/// Converts status text into samples.
pub fn parse(result: &ProbeResult) -> Vec<MetricSample> {
    let status_labels = [("vpn_type", VPN_TYPE)];

    let Some(output) = result.output() else {
        let mut samples = vec![families::TUNNEL_STATUS.sample(status_labels, 0.0)];
        samples.extend(error_sample(component::IPSEC, result));
        return samples;
    };

    let status = IpsecStatus::scan(output);
    let up = if status.established > 0 { 1.0 } else { 0.0 };

    let mut samples = vec![
        families::TUNNEL_STATUS.sample(status_labels, up),
        families::IPSEC_CONNECTIONS_ESTABLISHED.bare(status.established as f64),
        families::IPSEC_SAS_INSTALLED.bare(status.installed as f64),
    ];
    if let Some(rx) = status.rx_bytes {
        samples.push(families::IPSEC_RECEIVE_BYTES.bare(rx));
    }
    if let Some(tx) = status.tx_bytes {
        samples.push(families::IPSEC_TRANSMIT_BYTES.bare(tx));
    }
    samples
}
