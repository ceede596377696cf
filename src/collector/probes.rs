//! Probe wiring per subsystem.

use crate::config::{ExporterConfig, LatencyTarget};
use crate::probe::{CommandProbe, FileProbe, Probe};
use std::sync::Arc;
use std::time::Duration;

/// A probe together with its timeout.
#[derive(Clone)]
pub struct ProbeSlot {
    /// The probe itself.
    pub probe: Arc<dyn Probe>,
    /// Deadline passed to every run.
    pub timeout: Duration,
}

impl ProbeSlot {
    /// Wraps an owned probe.
    pub fn new(probe: impl Probe + 'static, timeout: Duration) -> Self {
        Self {
            probe: Arc::new(probe),
            timeout,
        }
    }

    /// Wraps an already shared probe.
    pub fn shared(probe: Arc<dyn Probe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }
}

/// The probes run on every scrape. `None` means the subsystem is disabled.
#[derive(Clone, Default)]
pub struct ProbeSet {
    /// `wg show <interface> dump`.
    pub wireguard: Option<ProbeSlot>,
    /// `ipsec statusall`.
    pub ipsec: Option<ProbeSlot>,
    /// Kernel interface table.
    pub interfaces: Option<ProbeSlot>,
    /// One ping per target, in configured order.
    pub latency: Vec<(LatencyTarget, ProbeSlot)>,
}

impl ProbeSet {
    /// Builds the real probes for every enabled subsystem.
    pub fn from_config(config: &ExporterConfig) -> Self {
        let wg = &config.wireguard;
        let wireguard = wg.enabled.then(|| {
            ProbeSlot::new(
                CommandProbe::wireguard_dump(&wg.binary, &wg.interface),
                wg.timeout(),
            )
        });

        let ipsec = config.ipsec.enabled.then(|| {
            ProbeSlot::new(
                CommandProbe::ipsec_statusall(&config.ipsec.binary),
                config.ipsec.timeout(),
            )
        });

        let interfaces = config.interfaces.enabled.then(|| {
            ProbeSlot::new(
                FileProbe::new(config.interfaces.path.clone()),
                config.interfaces.timeout(),
            )
        });

        let lat = &config.latency;
        let latency = if lat.enabled {
            lat.targets
                .iter()
                .map(|target| {
                    let probe =
                        CommandProbe::ping(&lat.binary, lat.count, lat.wait_secs, &target.address);
                    (target.clone(), ProbeSlot::new(probe, lat.timeout()))
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            wireguard,
            ipsec,
            interfaces,
            latency,
        }
    }
}
