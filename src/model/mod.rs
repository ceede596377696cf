//! Metric model, per-scrape registry and text rendering.
//!
//! A [`MetricRegistry`] is created for every collection cycle. Parsers push
//! [`MetricSample`]s into it and the orchestrator freezes it into a
//! [`Snapshot`], which renders to the Prometheus text exposition format.
//!
//! # Metrics Exposed
//!
//! ## Tunnel Status
//! - `vpn_tunnel_status{vpn_type,...}` - 1 when the subsystem is up
//!
//! ## WireGuard
//! - `wireguard_peer_receive_bytes_total` - Bytes received per peer
//! - `wireguard_peer_transmit_bytes_total` - Bytes sent per peer
//! - `wireguard_peer_last_handshake_seconds` - Latest handshake per peer
//!
//! ## IPsec
//! - `ipsec_connections_established` - Established IKE connections
//! - `ipsec_sas_installed` - Installed CHILD SAs
//! - `ipsec_receive_bytes_total` / `ipsec_transmit_bytes_total`
//!
//! ## Interfaces
//! - `vpn_interface_{rx,tx}_{bytes,packets,errors,drops}` - Kernel counters
//!
//! ## Latency
//! - `vpn_latency_ms` - Average round-trip time per target
//! - `vpn_latency_probe_up` - Whether the target answered
//!
//! ## Exporter
//! - `vpn_exporter_error{component,error}` - Probe failure diagnostics
//! - `vpn_exporter_info{version}` - Exporter identification

pub mod families;
mod registry;
mod sample;
mod text;

pub use registry::{MetricRegistry, Snapshot};
pub use sample::{Labels, MetricFamily, MetricKind, MetricSample};
pub use text::{escape_label_value, format_value, CONTENT_TYPE};
