//! `wg show <interface> dump` parser.
//!
//! The first line describes the interface itself. Every following line is a
//! tab-separated peer record:
//!
//! ```text
//! public-key  preshared-key  endpoint  allowed-ips  latest-handshake  transfer-rx  transfer-tx  persistent-keepalive
//! ```

use super::{component, error_sample, parse_counter};
use crate::config::KeyLabel;
use crate::model::{families, MetricSample};
use crate::probe::ProbeResult;

/// Minimum number of fields in a peer record.
pub const PEER_FIELDS: usize = 8;

const VPN_TYPE: &str = "wireguard";

/// A peer record extracted from the dump.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    /// Full public key, before redaction.
    pub public_key: String,
    /// `host:port`, or `unknown` when the peer has none.
    pub endpoint: String,
    /// Unix time, 0 if never.
    pub latest_handshake: f64,
    /// Bytes received from the peer.
    pub rx_bytes: f64,
    /// Bytes sent to the peer.
    pub tx_bytes: f64,
}

/// Parses one peer line, `None` if it is malformed.
pub fn parse_peer(line: &str) -> Option<PeerRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < PEER_FIELDS {
        return None;
    }

    let endpoint = match fields[2] {
        "(none)" | "" => "unknown",
        other => other,
    };

    Some(PeerRecord {
        public_key: fields[0].to_string(),
        endpoint: endpoint.to_string(),
        latest_handshake: parse_counter(fields[4])?,
        rx_bytes: parse_counter(fields[5])?,
        tx_bytes: parse_counter(fields[6])?,
    })
}

/// Converts a dump into samples for `interface`.
pub fn parse(result: &ProbeResult, interface: &str, key_label: &KeyLabel) -> Vec<MetricSample> {
    let status_labels = [("vpn_type", VPN_TYPE), ("interface", interface)];

    let Some(output) = result.output() else {
        let mut samples = vec![families::TUNNEL_STATUS.sample(status_labels, 0.0)];
        samples.extend(error_sample(component::WIREGUARD, result));
        return samples;
    };

    let mut samples = vec![families::TUNNEL_STATUS.sample(status_labels, 1.0)];

    // Skip the interface header line.
    for (line_no, line) in output.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let Some(peer) = parse_peer(line) else {
            tracing::debug!(line = line_no + 1, interface, "Skipping malformed peer record");
            continue;
        };

        let key = key_label.apply(&peer.public_key);
        let traffic_labels = [
            ("interface", interface),
            ("public_key", key.as_str()),
            ("endpoint", peer.endpoint.as_str()),
        ];
        samples.push(families::WG_PEER_RECEIVE_BYTES.sample(traffic_labels, peer.rx_bytes));
        samples.push(families::WG_PEER_TRANSMIT_BYTES.sample(traffic_labels, peer.tx_bytes));
        samples.push(families::WG_PEER_LAST_HANDSHAKE.sample(
            [("interface", interface), ("public_key", key.as_str())],
            peer.latest_handshake,
        ));
    }

    samples
}
