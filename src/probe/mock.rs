//! Canned probe for tests and dry runs.

use super::{Probe, ProbeFuture, ProbeResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns a fixed result, optionally after a delay.
///
/// The delay is subject to the timeout like a real probe: if it exceeds the
/// timeout the probe reports [`ProbeResult::Timeout`].
#[derive(Debug)]
pub struct MockProbe {
    result: ProbeResult,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockProbe {
    /// Creates a probe that always returns `result`.
    pub fn new(result: ProbeResult) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Shorthand for a successful probe with the given output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self::new(ProbeResult::Ok(output.into()))
    }

    /// Delays the result by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of times the probe has run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Probe for MockProbe {
    fn run(&self, timeout: Duration) -> ProbeFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if self.delay > timeout {
                tokio::time::sleep(timeout).await;
                return ProbeResult::Timeout;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        })
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_result() {
        let probe = MockProbe::ok("hello");
        assert_eq!(probe.run(Duration::from_secs(1)).await, ProbeResult::Ok("hello".into()));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_delay_exceeding_timeout() {
        let probe = MockProbe::ok("late").with_delay(Duration::from_secs(10));
        let result = probe.run(Duration::from_millis(10)).await;
        assert_eq!(result, ProbeResult::Timeout);
    }
}
