//! Exporter configuration.
//!
//! Loaded once at startup from built-in defaults, an optional TOML file and
//! environment overrides. Immutable afterwards and shared read-only.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address to listen on.
    pub bind_address: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Reuse a snapshot for this many milliseconds (0 disables caching).
    pub cache_ttl_ms: u64,
    /// `[wireguard]` section.
    pub wireguard: WireGuardConfig,
    /// `[ipsec]` section.
    pub ipsec: IpsecConfig,
    /// `[interfaces]` section.
    pub interfaces: InterfacesConfig,
    /// `[latency]` section.
    pub latency: LatencyConfig,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 9100,
            cache_ttl_ms: 0,
            wireguard: WireGuardConfig::default(),
            ipsec: IpsecConfig::default(),
            interfaces: InterfacesConfig::default(),
            latency: LatencyConfig::default(),
        }
    }
}

/// WireGuard peer probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGuardConfig {
    /// Whether this subsystem is probed.
    pub enabled: bool,
    /// Interface passed to `wg show`.
    pub interface: String,
    /// Path or name of the `wg` binary.
    pub binary: String,
    /// Probe timeout in seconds.
    pub timeout_secs: u64,
    /// How peer public keys appear in labels.
    pub key_label: KeyLabel,
}

impl Default for WireGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interface: "wg0".to_string(),
            binary: "wg".to_string(),
            timeout_secs: 5,
            key_label: KeyLabel::default(),
        }
    }
}

/// Redaction applied to peer public keys before they become label values.
///
/// Bounds label cardinality and keeps full keys out of the metrics store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum KeyLabel {
    /// First `length` characters followed by `...`.
    Truncate { length: usize },
    /// First `length` hex characters of the BLAKE3 digest of the key.
    Hash { length: usize },
    /// The key unchanged.
    Full,
}

impl Default for KeyLabel {
    fn default() -> Self {
        KeyLabel::Truncate { length: 12 }
    }
}

impl KeyLabel {
    /// Produces the label value for a public key.
    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyLabel::Truncate { length } => {
                let prefix: String = key.chars().take(*length).collect();
                format!("{prefix}...")
            }
            KeyLabel::Hash { length } => {
                let digest = blake3::hash(key.as_bytes()).to_hex();
                digest.chars().take(*length).collect()
            }
            KeyLabel::Full => key.to_string(),
        }
    }
}

/// IKE/IPsec daemon probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpsecConfig {
    /// Whether this subsystem is probed.
    pub enabled: bool,
    /// Path or name of the `ipsec` binary.
    pub binary: String,
    /// Probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IpsecConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "ipsec".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Kernel interface counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfacesConfig {
    /// Whether this subsystem is probed.
    pub enabled: bool,
    /// Interface statistics table.
    pub path: PathBuf,
    /// Only interfaces starting with one of these prefixes are exported.
    pub prefixes: Vec<String>,
    /// Probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InterfacesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("/proc/net/dev"),
            prefixes: ["wg0", "wg1", "ipsec0", "eth0", "ens", "enp"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_secs: 5,
        }
    }
}

/// Active round-trip probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Whether this subsystem is probed.
    pub enabled: bool,
    /// Path or name of the `ping` binary.
    pub binary: String,
    /// Echo requests per probe (`ping -c`).
    pub count: u32,
    /// Per-reply wait in seconds (`ping -W`).
    pub wait_secs: u64,
    /// Probe timeout in seconds.
    pub timeout_secs: u64,
    /// Endpoints pinged on every scrape, in label order.
    pub targets: Vec<LatencyTarget>,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "ping".to_string(),
            count: 3,
            wait_secs: 2,
            timeout_secs: 10,
            targets: vec![LatencyTarget::new("10.10.10.2", "wireguard")],
        }
    }
}

/// A tunnel endpoint to ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyTarget {
    /// Host or IP passed to `ping`.
    pub address: String,
    /// Tunnel the target is reached through, used as the `vpn_type` label.
    pub vpn_type: String,
}

impl LatencyTarget {
    /// Creates a target.
    pub fn new(address: impl Into<String>, vpn_type: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            vpn_type: vpn_type.into(),
        }
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this layout.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// An enabled subsystem has a zero timeout.
    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
    /// A truncate or hash key label with zero length.
    #[error("peer key label length must be greater than zero")]
    InvalidKeyLabel,
    /// Blank WireGuard interface name.
    #[error("wireguard interface name must not be empty")]
    EmptyInterface,
    /// Blank latency target address.
    #[error("latency target address must not be empty")]
    EmptyLatencyTarget,
}

impl ExporterConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wireguard.enabled {
            if self.wireguard.timeout_secs == 0 {
                return Err(ConfigError::ZeroTimeout("wireguard"));
            }
            if self.wireguard.interface.trim().is_empty() {
                return Err(ConfigError::EmptyInterface);
            }
            match self.wireguard.key_label {
                KeyLabel::Truncate { length: 0 } | KeyLabel::Hash { length: 0 } => {
                    return Err(ConfigError::InvalidKeyLabel);
                }
                _ => {}
            }
        }
        if self.ipsec.enabled && self.ipsec.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("ipsec"));
        }
        if self.interfaces.enabled && self.interfaces.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("interfaces"));
        }
        if self.latency.enabled {
            if self.latency.timeout_secs == 0 {
                return Err(ConfigError::ZeroTimeout("latency"));
            }
            if self.latency.targets.iter().any(|t| t.address.trim().is_empty()) {
                return Err(ConfigError::EmptyLatencyTarget);
            }
        }
        Ok(())
    }

    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Snapshot cache lifetime, `None` when caching is disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_ms > 0).then(|| Duration::from_millis(self.cache_ttl_ms))
    }
}

impl WireGuardConfig {
    /// Probe timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl IpsecConfig {
    /// Probe timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl InterfacesConfig {
    /// Probe timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LatencyConfig {
    /// Probe timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ExporterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().port(), 9100);
        assert_eq!(config.cache_ttl(), None);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ExporterConfig::from_toml("").unwrap();
        assert_eq!(config.wireguard.interface, "wg0");
        assert_eq!(config.ipsec.timeout_secs, 10);
        assert_eq!(config.latency.targets.len(), 1);
    }

    #[test]
    fn test_partial_toml() {
        let config = ExporterConfig::from_toml(
            r#"
            port = 9200
            cache_ttl_ms = 1000

            [wireguard]
            interface = "wg1"
            key_label = { scheme = "hash", length = 16 }

            [ipsec]
            enabled = false

            [latency]
            targets = [
                { address = "10.10.10.2", vpn_type = "wireguard" },
                { address = "10.0.2.10", vpn_type = "ipsec" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9200);
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(1)));
        assert_eq!(config.wireguard.interface, "wg1");
        assert_eq!(config.wireguard.binary, "wg");
        assert_eq!(config.wireguard.key_label, KeyLabel::Hash { length: 16 });
        assert!(!config.ipsec.enabled);
        assert_eq!(config.latency.targets[1], LatencyTarget::new("10.0.2.10", "ipsec"));
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let mut config = ExporterConfig::default();
        config.wireguard.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTimeout("wireguard"))
        ));

        // Disabled subsystems are not checked.
        config.wireguard.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_key_length_invalid() {
        let mut config = ExporterConfig::default();
        config.wireguard.key_label = KeyLabel::Truncate { length: 0 };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidKeyLabel)));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ExporterConfig::from_toml("port = \"not a number\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_key_label_schemes() {
        let key = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";

        assert_eq!(KeyLabel::default().apply(key), "xTIBA5rboUvn...");
        assert_eq!(KeyLabel::Full.apply(key), key);

        let hashed = KeyLabel::Hash { length: 16 }.apply(key);
        assert_eq!(hashed.len(), 16);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hashed, KeyLabel::Hash { length: 16 }.apply(key));
        assert_ne!(hashed, KeyLabel::Hash { length: 16 }.apply("other"));
    }
}
