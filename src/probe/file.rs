//! Kernel table probe.

use super::{ExecutionError, Probe, ProbeFuture, ProbeResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

/// Reads a file such as `/proc/net/dev`.
#[derive(Debug, Clone)]
pub struct FileProbe {
    path: PathBuf,
}

impl FileProbe {
    /// Creates a probe reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self, timeout: Duration) -> ProbeResult {
        match tokio::time::timeout(timeout, tokio::fs::read_to_string(&self.path)).await {
            Err(_) => ProbeResult::Timeout,
            Ok(Ok(content)) => ProbeResult::Ok(content),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                ProbeResult::Unavailable(format!("{} not found", self.path.display()))
            }
            Ok(Err(e)) => ProbeResult::ExecutionError(ExecutionError::Io(e.to_string())),
        }
    }
}

impl Probe for FileProbe {
    fn run(&self, timeout: Duration) -> ProbeFuture<'_> {
        Box::pin(self.read(timeout))
    }

    fn describe(&self) -> String {
        format!("read {}", self.path.display())
    }
}
