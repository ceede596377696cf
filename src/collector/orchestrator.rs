//! Collection cycle orchestration.

use super::{ExporterStats, ProbeSet, ProbeSlot, ScrapeCache, StatsError};
use crate::config::{ExporterConfig, LatencyTarget};
use crate::model::{families, MetricRegistry, Snapshot};
use crate::parse::{self, component};
use crate::probe::{ExecutionError, ProbeResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Extra time granted past a probe's own timeout before the orchestrator
/// gives up on it.
const PROBE_GRACE: Duration = Duration::from_secs(1);

/// A probed subsystem. Results are merged in the order these are created.
#[derive(Debug, Clone, PartialEq)]
pub enum Subsystem {
    /// WireGuard peers.
    WireGuard,
    /// IKE daemon.
    Ipsec,
    /// Kernel interface counters.
    Network,
    /// Round-trip time to one target.
    Latency(LatencyTarget),
}

impl Subsystem {
    /// Component label used in diagnostics.
    pub fn component(&self) -> &'static str {
        match self {
            Subsystem::WireGuard => component::WIREGUARD,
            Subsystem::Ipsec => component::IPSEC,
            Subsystem::Network => component::NETWORK,
            Subsystem::Latency(_) => component::LATENCY,
        }
    }
}

/// Progress of one subsystem within a collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SubsystemState {
    /// The probe has not reported yet.
    Pending,
    /// The probe finished, failed or was abandoned.
    Done(ProbeResult),
}

/// Phase of a scrape, traced on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrapePhase {
    Idle,
    Collecting,
    Rendering,
}

/// Per-scrape bookkeeping.
struct CollectionCycle {
    phase: ScrapePhase,
    subsystems: Vec<(Subsystem, SubsystemState)>,
}

impl CollectionCycle {
    fn new() -> Self {
        Self {
            phase: ScrapePhase::Idle,
            subsystems: Vec::new(),
        }
    }

    fn start(&mut self, subsystems: impl IntoIterator<Item = Subsystem>) {
        self.phase = ScrapePhase::Collecting;
        self.subsystems = subsystems
            .into_iter()
            .map(|s| (s, SubsystemState::Pending))
            .collect();
    }

    fn complete(&mut self, index: usize, result: ProbeResult) {
        if let Some((_, state)) = self.subsystems.get_mut(index) {
            *state = SubsystemState::Done(result);
        }
    }

    fn pending(&self) -> usize {
        self.subsystems
            .iter()
            .filter(|(_, s)| *s == SubsystemState::Pending)
            .count()
    }

    fn transition(&mut self, phase: ScrapePhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "Scrape phase change");
        self.phase = phase;
    }
}

/// Runs every probe, parses the results and builds a [`Snapshot`].
///
/// Holds only immutable configuration; each call to
/// [`collect_all`](Self::collect_all) works on its own state, so concurrent
/// scrapes do not interfere.
pub struct Orchestrator {
    config: Arc<ExporterConfig>,
    probes: ProbeSet,
    stats: ExporterStats,
    cache: Option<ScrapeCache>,
}

impl Orchestrator {
    /// Creates an orchestrator with the real probes described by `config`.
    pub fn new(config: Arc<ExporterConfig>) -> Result<Self, StatsError> {
        let probes = ProbeSet::from_config(&config);
        Self::with_probes(config, probes)
    }

    /// Creates an orchestrator with explicit probes.
    pub fn with_probes(config: Arc<ExporterConfig>, probes: ProbeSet) -> Result<Self, StatsError> {
        let cache = config.cache_ttl().map(ScrapeCache::new);
        Ok(Self {
            config,
            probes,
            stats: ExporterStats::new()?,
            cache,
        })
    }

    /// Exporter self-metrics accumulated across scrapes.
    pub fn stats(&self) -> &ExporterStats {
        &self.stats
    }

    fn jobs(&self) -> Vec<(Subsystem, ProbeSlot)> {
        let mut jobs = Vec::new();
        if let Some(slot) = &self.probes.wireguard {
            jobs.push((Subsystem::WireGuard, slot.clone()));
        }
        if let Some(slot) = &self.probes.ipsec {
            jobs.push((Subsystem::Ipsec, slot.clone()));
        }
        if let Some(slot) = &self.probes.interfaces {
            jobs.push((Subsystem::Network, slot.clone()));
        }
        for (target, slot) in &self.probes.latency {
            jobs.push((Subsystem::Latency(target.clone()), slot.clone()));
        }
        jobs
    }

    /// Runs one full collection cycle.
    ///
    /// Never fails: a subsystem whose probe errors, times out or panics
    /// contributes its down-status and diagnostic samples instead.
    pub async fn collect_all(&self) -> Snapshot {
        let jobs = self.jobs();
        let mut cycle = CollectionCycle::new();
        cycle.start(jobs.iter().map(|(s, _)| s.clone()));

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(subsystem, slot)| {
                let ProbeSlot { probe, timeout } = slot;
                tracing::debug!(component = subsystem.component(), probe = %probe.describe(), "Running probe");
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout + PROBE_GRACE, probe.run(timeout)).await {
                        Ok(result) => result,
                        Err(_) => ProbeResult::Timeout,
                    }
                })
            })
            .collect();

        for (index, handle) in handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => ProbeResult::ExecutionError(ExecutionError::Unexpected(
                    "probe task panicked".to_string(),
                )),
                Err(e) => ProbeResult::ExecutionError(ExecutionError::Unexpected(e.to_string())),
            };
            cycle.complete(index, result);
        }
        debug_assert_eq!(cycle.pending(), 0);

        cycle.transition(ScrapePhase::Rendering);
        let snapshot = self.build_snapshot(&cycle);
        cycle.transition(ScrapePhase::Idle);
        snapshot
    }

    fn build_snapshot(&self, cycle: &CollectionCycle) -> Snapshot {
        let mut registry = MetricRegistry::new();

        for (subsystem, state) in &cycle.subsystems {
            let SubsystemState::Done(result) = state else {
                continue;
            };
            self.log_outcome(subsystem, result);

            let samples = match subsystem {
                Subsystem::WireGuard => parse::wireguard::parse(
                    result,
                    &self.config.wireguard.interface,
                    &self.config.wireguard.key_label,
                ),
                Subsystem::Ipsec => parse::ipsec::parse(result),
                Subsystem::Network => {
                    parse::netdev::parse(result, &self.config.interfaces.prefixes)
                }
                Subsystem::Latency(target) => parse::ping::parse(result, target),
            };
            registry.extend(samples);
        }

        registry.push(families::EXPORTER_INFO.sample([("version", crate::VERSION)], 1.0));
        registry.finish()
    }

    fn log_outcome(&self, subsystem: &Subsystem, result: &ProbeResult) {
        let component = subsystem.component();
        let Some(reason) = result.error_label() else {
            tracing::debug!(component, "Probe succeeded");
            return;
        };
        self.stats.record_failure(component, reason);

        match result {
            ProbeResult::Unavailable(detail) => {
                tracing::warn!(component, reason, detail = %detail, "Probe unavailable")
            }
            ProbeResult::ExecutionError(err) => {
                tracing::warn!(component, reason, error = %err, "Probe failed")
            }
            _ => tracing::warn!(component, reason, "Probe failed"),
        }
    }

    /// Collects a snapshot, reusing a cached one when caching is enabled.
    pub async fn scrape(&self) -> Arc<Snapshot> {
        let started = Instant::now();
        let snapshot = match &self.cache {
            Some(cache) => cache.get_or_collect(|| self.collect_all()).await,
            None => Arc::new(self.collect_all().await),
        };
        self.stats.observe_scrape(started.elapsed());
        snapshot
    }

    /// Produces the full `/metrics` body: the snapshot followed by the
    /// exporter's own metrics.
    pub async fn render(&self) -> String {
        let snapshot = self.scrape().await;
        let mut body = snapshot.render();
        match self.stats.encode() {
            Ok(stats) => body.push_str(&stats),
            Err(e) => tracing::warn!(error = %e, "Failed to encode exporter metrics"),
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{MockProbe, Probe, ProbeFuture};

    const TIMEOUT: Duration = Duration::from_millis(500);

    const WG_DUMP: &str = "\
privkey\tpubkey\t51820\toff
xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=\t(none)\t192.95.5.69:41414\t10.0.0.2/32\t1700000000\t4096\t8192\t25
";

    const STATUSALL: &str = "\
site-a[1]: ESTABLISHED 5 minutes ago, 10.0.2.10[moon]...10.0.2.20[sun]
site-a{1}:  INSTALLED, TUNNEL, reqid 1
site-a{1}:  AES_CBC_128/HMAC_SHA2_256_128, 100 bytes_i (1 pkts, 1s ago), 200 bytes_o (2 pkts, 1s ago)
";

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  500 5 0 0 0 0 0 0  500 5 0 0 0 0 0 0
   wg0: 1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0
";

    const PING: &str = "rtt min/avg/max/mdev = 0.412/0.538/0.701/0.118 ms\n";

    struct PanicProbe;

    impl Probe for PanicProbe {
        fn run(&self, _timeout: Duration) -> ProbeFuture<'_> {
            Box::pin(async { panic!("probe exploded") })
        }

        fn describe(&self) -> String {
            "panic".to_string()
        }
    }

    /// Ignores its timeout entirely.
    struct StuckProbe;

    impl Probe for StuckProbe {
        fn run(&self, _timeout: Duration) -> ProbeFuture<'_> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                ProbeResult::Ok(String::new())
            })
        }

        fn describe(&self) -> String {
            "stuck".to_string()
        }
    }

    #[test]
    fn test_cycle_tracks_pending_and_phase() {
        let mut cycle = CollectionCycle::new();
        assert_eq!(cycle.phase, ScrapePhase::Idle);

        cycle.start([Subsystem::WireGuard, Subsystem::Ipsec]);
        assert_eq!(cycle.phase, ScrapePhase::Collecting);
        assert_eq!(cycle.pending(), 2);

        cycle.complete(1, ProbeResult::Timeout);
        assert_eq!(cycle.pending(), 1);
        cycle.complete(0, ProbeResult::Ok(String::new()));
        assert_eq!(cycle.pending(), 0);
        assert_eq!(
            cycle.subsystems[1],
            (Subsystem::Ipsec, SubsystemState::Done(ProbeResult::Timeout))
        );

        cycle.transition(ScrapePhase::Rendering);
        assert_eq!(cycle.phase, ScrapePhase::Rendering);
    }

    fn slot(probe: impl Probe + 'static) -> ProbeSlot {
        ProbeSlot::new(probe, TIMEOUT)
    }

    fn healthy_probes() -> ProbeSet {
        ProbeSet {
            wireguard: Some(slot(MockProbe::ok(WG_DUMP))),
            ipsec: Some(slot(MockProbe::ok(STATUSALL))),
            interfaces: Some(slot(MockProbe::ok(NET_DEV))),
            latency: vec![(
                LatencyTarget::new("10.10.10.2", "wireguard"),
                slot(MockProbe::ok(PING)),
            )],
        }
    }

    fn failing_probes() -> ProbeSet {
        ProbeSet {
            wireguard: Some(slot(MockProbe::new(ProbeResult::Unavailable(
                "wg not found".into(),
            )))),
            ipsec: Some(slot(MockProbe::new(ProbeResult::Timeout))),
            interfaces: Some(slot(MockProbe::new(ProbeResult::ExecutionError(
                ExecutionError::Io("permission denied".into()),
            )))),
            latency: vec![(
                LatencyTarget::new("10.10.10.2", "wireguard"),
                slot(MockProbe::new(ProbeResult::Unavailable("ping not found".into()))),
            )],
        }
    }

    fn orchestrator(probes: ProbeSet) -> Orchestrator {
        Orchestrator::with_probes(Arc::new(ExporterConfig::default()), probes).unwrap()
    }

    #[tokio::test]
    async fn test_healthy_collection() {
        let snapshot = orchestrator(healthy_probes()).collect_all().await;

        let wg = snapshot
            .find("vpn_tunnel_status", &[("vpn_type", "wireguard"), ("interface", "wg0")])
            .unwrap();
        assert_eq!(wg.value, 1.0);
        let ipsec = snapshot
            .find("vpn_tunnel_status", &[("vpn_type", "ipsec")])
            .unwrap();
        assert_eq!(ipsec.value, 1.0);

        assert_eq!(snapshot.samples("wireguard_peer_receive_bytes_total").len(), 1);
        assert_eq!(snapshot.samples("ipsec_receive_bytes_total")[0].value, 100.0);
        assert_eq!(snapshot.samples("vpn_interface_rx_bytes").len(), 1);
        assert!(snapshot
            .find("vpn_interface_rx_bytes", &[("interface", "lo")])
            .is_none());
        assert_eq!(snapshot.samples("vpn_latency_ms")[0].value, 0.538);
        assert!(snapshot.samples("vpn_exporter_error").is_empty());
        assert_eq!(
            snapshot
                .find("vpn_exporter_info", &[("version", crate::VERSION)])
                .unwrap()
                .value,
            1.0
        );
    }

    #[tokio::test]
    async fn test_everything_failing_still_well_formed() {
        let orchestrator = orchestrator(failing_probes());
        let snapshot = orchestrator.collect_all().await;
        let text = snapshot.render();

        for family in families::ALL {
            assert!(text.contains(&format!("# HELP {} ", family.name)));
            assert!(text.contains(&format!("# TYPE {} {}\n", family.name, family.kind)));
        }
        assert!(text.ends_with('\n'));

        assert!(text.contains("vpn_tunnel_status{interface=\"wg0\",vpn_type=\"wireguard\"} 0\n"));
        assert!(text.contains("vpn_tunnel_status{vpn_type=\"ipsec\"} 0\n"));
        assert!(text.contains("vpn_exporter_error{component=\"wireguard\",error=\"not_found\"} 1\n"));
        assert!(text.contains("vpn_exporter_error{component=\"ipsec\",error=\"timeout\"} 1\n"));
        assert!(text.contains("vpn_exporter_error{component=\"network\",error=\"io_error\"} 1\n"));
        assert!(text.contains(
            "vpn_latency_probe_up{target=\"10.10.10.2\",vpn_type=\"wireguard\"} 0\n"
        ));
        assert!(text.contains(&format!("vpn_exporter_info{{version=\"{}\"}} 1\n", crate::VERSION)));

        assert_eq!(orchestrator.stats().failures("wireguard", "not_found"), 1);
        assert_eq!(orchestrator.stats().failures("latency", "not_found"), 1);
    }

    #[tokio::test]
    async fn test_panicking_probe_isolated() {
        let mut probes = healthy_probes();
        probes.ipsec = Some(slot(PanicProbe));
        let snapshot = orchestrator(probes).collect_all().await;

        let ipsec = snapshot
            .find("vpn_tunnel_status", &[("vpn_type", "ipsec")])
            .unwrap();
        assert_eq!(ipsec.value, 0.0);
        assert!(snapshot
            .find(
                "vpn_exporter_error",
                &[("component", "ipsec"), ("error", "unexpected_failure")]
            )
            .is_some());

        // Other subsystems are unaffected.
        let wg = snapshot
            .find("vpn_tunnel_status", &[("vpn_type", "wireguard")])
            .unwrap();
        assert_eq!(wg.value, 1.0);
        assert_eq!(snapshot.samples("vpn_interface_tx_bytes")[0].value, 2000.0);
    }

    #[tokio::test]
    async fn test_stuck_probe_times_out() {
        let mut probes = healthy_probes();
        probes.wireguard = Some(ProbeSlot::new(StuckProbe, Duration::from_millis(10)));

        let started = Instant::now();
        let snapshot = orchestrator(probes).collect_all().await;
        assert!(started.elapsed() < Duration::from_secs(10));

        assert!(snapshot
            .find(
                "vpn_exporter_error",
                &[("component", "wireguard"), ("error", "timeout")]
            )
            .is_some());
        assert_eq!(
            snapshot
                .find("vpn_tunnel_status", &[("vpn_type", "ipsec")])
                .unwrap()
                .value,
            1.0
        );
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let delay = Duration::from_millis(200);
        let probes = ProbeSet {
            wireguard: Some(slot(MockProbe::ok(WG_DUMP).with_delay(delay))),
            ipsec: Some(slot(MockProbe::ok(STATUSALL).with_delay(delay))),
            interfaces: Some(slot(MockProbe::ok(NET_DEV).with_delay(delay))),
            latency: Vec::new(),
        };

        let started = Instant::now();
        orchestrator(probes).collect_all().await;
        assert!(started.elapsed() < delay * 3);
    }

    #[tokio::test]
    async fn test_collect_all_idempotent() {
        let orchestrator = orchestrator(healthy_probes());
        let first = orchestrator.collect_all().await.render();
        let second = orchestrator.collect_all().await.render();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_merge_order_independent_of_completion_order() {
        let mut probes = healthy_probes();
        // WireGuard finishes last but is still rendered first.
        probes.wireguard = Some(slot(
            MockProbe::ok(WG_DUMP).with_delay(Duration::from_millis(100)),
        ));
        let snapshot = orchestrator(probes).collect_all().await;

        let status = snapshot.samples("vpn_tunnel_status");
        assert_eq!(status[0].label("vpn_type"), Some("wireguard"));
        assert_eq!(status[1].label("vpn_type"), Some("ipsec"));
    }

    #[tokio::test]
    async fn test_disabled_ipsec_emits_nothing() {
        let mut probes = healthy_probes();
        probes.ipsec = None;
        let snapshot = orchestrator(probes).collect_all().await;

        assert!(snapshot
            .find("vpn_tunnel_status", &[("vpn_type", "ipsec")])
            .is_none());
        assert!(snapshot.samples("ipsec_connections_established").is_empty());
        assert!(snapshot
            .render()
            .contains("# TYPE ipsec_connections_established gauge\n"));
    }

    #[tokio::test]
    async fn test_duplicate_redacted_keys_first_wins() {
        let dump = "\
privkey\tpubkey\t51820\toff
AAAAAAAAAAAAfirst\t(none)\t1.2.3.4:51820\t10.0.0.2/32\t1\t111\t222\toff
AAAAAAAAAAAAsecond\t(none)\t1.2.3.4:51820\t10.0.0.3/32\t2\t333\t444\toff
";
        let mut probes = healthy_probes();
        probes.wireguard = Some(slot(MockProbe::ok(dump)));
        let snapshot = orchestrator(probes).collect_all().await;

        let rx = snapshot.samples("wireguard_peer_receive_bytes_total");
        assert_eq!(rx.len(), 1);
        assert_eq!(rx[0].value, 111.0);
    }

    #[tokio::test]
    async fn test_cache_reuses_snapshot() {
        let wg = Arc::new(MockProbe::ok(WG_DUMP));
        let probes = ProbeSet {
            wireguard: Some(ProbeSlot::shared(wg.clone(), TIMEOUT)),
            ..ProbeSet::default()
        };
        let config = ExporterConfig {
            cache_ttl_ms: 60_000,
            ..ExporterConfig::default()
        };
        let orchestrator = Orchestrator::with_probes(Arc::new(config), probes).unwrap();

        let first = orchestrator.scrape().await;
        let second = orchestrator.scrape().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(wg.calls(), 1);
        assert_eq!(orchestrator.stats().scrapes(), 2);
    }

    #[tokio::test]
    async fn test_render_appends_exporter_stats() {
        let body = orchestrator(failing_probes()).render().await;
        assert!(body.contains("# TYPE vpn_tunnel_status gauge\n"));
        assert!(body.contains("vpn_exporter_scrapes_total 1"));
        assert!(body.contains(
            "vpn_exporter_probe_failures_total{component=\"ipsec\",reason=\"timeout\"} 1"
        ));
    }
}
