//! VPN Metrics Exporter Library
//!
//! Exposes WireGuard, IPsec, interface and latency metrics for a VPN host
//! in the Prometheus text exposition format.
//!
//! # Architecture
//!
//! Every scrape runs a fresh collection cycle:
//!
//! ```text
//! probe (wg / ipsec / /proc/net/dev / ping) → parse → registry → text
//!                          ↑
//!                     orchestrator
//! ```
//!
//! # Design Principles
//!
//! - **Never fail a scrape**: a broken subsystem reports a down status and a
//!   diagnostic sample instead of an HTTP error
//! - **Bounded**: every external command runs under a timeout
//! - **No shared mutable state**: each scrape builds its own snapshot
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vpn_exporter::{collector::Orchestrator, config::ExporterConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ExporterConfig::default());
//! let orchestrator = Orchestrator::new(config)?;
//!
//! let snapshot = orchestrator.collect_all().await;
//! print!("{}", snapshot.render());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod collector;
pub mod config;
pub mod model;
pub mod parse;
pub mod probe;
pub mod server;

// Re-export commonly used types at crate root
pub use collector::Orchestrator;
pub use config::{ConfigError, ExporterConfig};
pub use model::{MetricRegistry, MetricSample, Snapshot};
pub use probe::{Probe, ProbeResult};
pub use server::{MetricsServer, MetricsServerConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
