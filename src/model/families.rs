//! Metric families exported on every scrape.
//!
//! The order of [`ALL`] is the order families appear in the rendered
//! document.

use super::{MetricFamily, MetricKind};

const fn counter(name: &'static str, help: &'static str) -> MetricFamily {
    MetricFamily {
        name,
        help,
        kind: MetricKind::Counter,
    }
}

const fn gauge(name: &'static str, help: &'static str) -> MetricFamily {
    MetricFamily {
        name,
        help,
        kind: MetricKind::Gauge,
    }
}

// Tunnel status
/// Labels: `vpn_type`, plus `interface` for WireGuard.
pub const TUNNEL_STATUS: MetricFamily =
    gauge("vpn_tunnel_status", "VPN tunnel status (1=up, 0=down)");

// WireGuard peers
/// Labels: `interface`, `public_key`, `endpoint`.
pub const WG_PEER_RECEIVE_BYTES: MetricFamily = counter(
    "wireguard_peer_receive_bytes_total",
    "Total bytes received from WireGuard peer",
);
/// Labels: `interface`, `public_key`, `endpoint`.
pub const WG_PEER_TRANSMIT_BYTES: MetricFamily = counter(
    "wireguard_peer_transmit_bytes_total",
    "Total bytes sent to WireGuard peer",
);
/// Labels: `interface`, `public_key`. Zero if the peer never completed a handshake.
pub const WG_PEER_LAST_HANDSHAKE: MetricFamily = gauge(
    "wireguard_peer_last_handshake_seconds",
    "Unix time of the latest handshake with the WireGuard peer",
);

// IPsec
/// Count of `ESTABLISHED` IKE SAs.
pub const IPSEC_CONNECTIONS_ESTABLISHED: MetricFamily = gauge(
    "ipsec_connections_established",
    "Number of established IPsec connections",
);
/// Count of `INSTALLED` CHILD SAs.
pub const IPSEC_SAS_INSTALLED: MetricFamily = gauge(
    "ipsec_sas_installed",
    "Number of installed IPsec security associations",
);
/// First `bytes_i` counter in the status text.
pub const IPSEC_RECEIVE_BYTES: MetricFamily =
    counter("ipsec_receive_bytes_total", "Total bytes received over IPsec");
/// First `bytes_o` counter in the status text.
pub const IPSEC_TRANSMIT_BYTES: MetricFamily =
    counter("ipsec_transmit_bytes_total", "Total bytes sent over IPsec");

// Kernel interface counters
/// Labels: `interface`.
pub const IFACE_RX_BYTES: MetricFamily =
    counter("vpn_interface_rx_bytes", "Network interface received bytes");
/// Labels: `interface`.
pub const IFACE_TX_BYTES: MetricFamily =
    counter("vpn_interface_tx_bytes", "Network interface transmitted bytes");
/// Labels: `interface`.
pub const IFACE_RX_PACKETS: MetricFamily =
    counter("vpn_interface_rx_packets", "Network interface received packets");
/// Labels: `interface`.
pub const IFACE_TX_PACKETS: MetricFamily = counter(
    "vpn_interface_tx_packets",
    "Network interface transmitted packets",
);
/// Labels: `interface`.
pub const IFACE_RX_ERRORS: MetricFamily =
    counter("vpn_interface_rx_errors", "Network interface receive errors");
/// Labels: `interface`.
pub const IFACE_TX_ERRORS: MetricFamily =
    counter("vpn_interface_tx_errors", "Network interface transmit errors");
/// Labels: `interface`.
pub const IFACE_RX_DROPS: MetricFamily = counter(
    "vpn_interface_rx_drops",
    "Network interface dropped inbound packets",
);
/// Labels: `interface`.
pub const IFACE_TX_DROPS: MetricFamily = counter(
    "vpn_interface_tx_drops",
    "Network interface dropped outbound packets",
);

// Latency
/// Average RTT. Labels: `vpn_type`, `target`.
pub const LATENCY_MS: MetricFamily =
    gauge("vpn_latency_ms", "VPN tunnel latency in milliseconds");
/// Labels: `vpn_type`, `target`.
pub const LATENCY_PROBE_UP: MetricFamily = gauge(
    "vpn_latency_probe_up",
    "Whether the latency probe reached its target (1=yes, 0=no)",
);

// Exporter self-diagnostics
/// Labels: `component`, `error`. Present only while a probe is failing.
pub const EXPORTER_ERROR: MetricFamily = gauge(
    "vpn_exporter_error",
    "Exporter probe error by component (1=error present)",
);
/// Labels: `version`.
pub const EXPORTER_INFO: MetricFamily = gauge("vpn_exporter_info", "VPN metrics exporter info");

/// Every family this exporter supports, in render order.
pub const ALL: &[MetricFamily] = &[
    TUNNEL_STATUS,
    WG_PEER_RECEIVE_BYTES,
    WG_PEER_TRANSMIT_BYTES,
    WG_PEER_LAST_HANDSHAKE,
    IPSEC_CONNECTIONS_ESTABLISHED,
    IPSEC_SAS_INSTALLED,
    IPSEC_RECEIVE_BYTES,
    IPSEC_TRANSMIT_BYTES,
    IFACE_RX_BYTES,
    IFACE_TX_BYTES,
    IFACE_RX_PACKETS,
    IFACE_TX_PACKETS,
    IFACE_RX_ERRORS,
    IFACE_TX_ERRORS,
    IFACE_RX_DROPS,
    IFACE_TX_DROPS,
    LATENCY_MS,
    LATENCY_PROBE_UP,
    EXPORTER_ERROR,
    EXPORTER_INFO,
];
