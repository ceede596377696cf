//! Probe executors.
//!
//! A probe runs one external tool (or reads one kernel table) under a
//! timeout and reports the outcome as a [`ProbeResult`]. Probes never return
//! errors: every failure mode is a distinct variant that the parsers turn
//! into down-status or diagnostic samples.

mod command;
mod file;
mod mock;

pub use command::CommandProbe;
pub use file::FileProbe;
pub use mock::MockProbe;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a single probe invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    /// The tool ran successfully; holds its standard output.
    Ok(String),
    /// The tool or file does not exist on this host.
    Unavailable(String),
    /// The tool did not finish within its timeout.
    Timeout,
    /// The tool ran but failed.
    ExecutionError(ExecutionError),
}

/// Why a probe that did run failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The tool exited unsuccessfully.
    #[error("exited with status {}: {stderr}", exit_code_text(.code))]
    NonZeroExit {
        /// Exit code, `None` if killed by a signal.
        code: Option<i32>,
        /// Trimmed and truncated standard error.
        stderr: String,
    },

    /// Spawning or reading failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// The probe task panicked or was cancelled.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

fn exit_code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl ProbeResult {
    /// Returns the raw output of a successful probe.
    pub fn output(&self) -> Option<&str> {
        match self {
            ProbeResult::Ok(text) => Some(text),
            _ => None,
        }
    }

    /// Stable label value describing a failure, `None` on success.
    pub fn error_label(&self) -> Option<&'static str> {
        match self {
            ProbeResult::Ok(_) => None,
            ProbeResult::Unavailable(_) => Some("not_found"),
            ProbeResult::Timeout => Some("timeout"),
            ProbeResult::ExecutionError(ExecutionError::NonZeroExit { .. }) => {
                Some("non_zero_exit")
            }
            ProbeResult::ExecutionError(ExecutionError::Io(_)) => Some("io_error"),
            ProbeResult::ExecutionError(ExecutionError::Unexpected(_)) => {
                Some("unexpected_failure")
            }
        }
    }
}

/// Boxed future returned by [`Probe::run`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = ProbeResult> + Send + 'a>>;

/// A source of raw status text.
///
/// Implementations must honor the timeout and must not panic; the
/// orchestrator still guards against both.
pub trait Probe: Send + Sync {
    /// Runs the probe once.
    fn run(&self, timeout: Duration) -> ProbeFuture<'_>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}
