//! VPN Metrics Exporter
//!
//! Serves WireGuard, IPsec, interface and latency metrics for Prometheus.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use vpn_exporter::{
    collector::Orchestrator,
    config::ExporterConfig,
    server::{MetricsServer, MetricsServerConfig},
};

#[derive(Debug, Parser)]
#[command(name = "vpn-exporter", version, about = "Prometheus exporter for VPN tunnels")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "VPN_EXPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// WireGuard interface to inspect
    #[arg(short, long, env = "WIREGUARD_INTERFACE")]
    interface: Option<String>,

    /// Whether to query the IPsec daemon ("true" in any case enables it)
    #[arg(long, env = "IPSEC_CHECK", value_parser = parse_enabled)]
    ipsec_check: Option<bool>,
}

/// Only "true", in any case, enables a switch; every other value disables it.
fn parse_enabled(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value.eq_ignore_ascii_case("true"))
}

impl Args {
    fn load(&self) -> Result<ExporterConfig, vpn_exporter::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interface) = &self.interface {
            config.wireguard.interface = interface.clone();
        }
        if let Some(enabled) = self.ipsec_check {
            config.ipsec.enabled = enabled;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match args.load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("VPN Metrics Exporter v{}", vpn_exporter::VERSION);
    info!(
        wireguard = config.wireguard.enabled,
        interface = %config.wireguard.interface,
        ipsec = config.ipsec.enabled,
        interfaces = config.interfaces.enabled,
        latency_targets = config.latency.targets.len(),
        "Configured subsystems"
    );
    if let Some(ttl) = config.cache_ttl() {
        info!(ttl_ms = ttl.as_millis() as u64, "Scrape cache enabled");
    }

    let server_config = MetricsServerConfig::from(&config);
    let orchestrator = match Orchestrator::new(Arc::new(config)) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            error!("Failed to initialize exporter metrics: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = MetricsServer::new(server_config, orchestrator).run().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
