//! External command probe.

use super::{ExecutionError, Probe, ProbeFuture, ProbeResult};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum number of stderr bytes kept in a failure result.
const MAX_STDERR_BYTES: usize = 256;

/// Runs an external tool and captures its standard output.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    /// Creates a probe for `program` with the given arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `wg show <interface> dump`
    pub fn wireguard_dump(binary: &str, interface: &str) -> Self {
        Self::new(binary, ["show", interface, "dump"])
    }

    /// `ipsec statusall`
    pub fn ipsec_statusall(binary: &str) -> Self {
        Self::new(binary, ["statusall"])
    }

    /// `ping -c <count> -W <wait> <target>`
    pub fn ping(binary: &str, count: u32, wait_secs: u64, target: &str) -> Self {
        Self::new(
            binary,
            [
                "-c".to_string(),
                count.to_string(),
                "-W".to_string(),
                wait_secs.to_string(),
                target.to_string(),
            ],
        )
    }

    async fn execute(&self, timeout: Duration) -> ProbeResult {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => return ProbeResult::Timeout,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return ProbeResult::Unavailable(format!("{} not found", self.program));
            }
            Ok(Err(e)) => return ProbeResult::ExecutionError(ExecutionError::Io(e.to_string())),
            Ok(Ok(output)) => output,
        };

        if output.status.success() {
            ProbeResult::Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            ProbeResult::ExecutionError(ExecutionError::NonZeroExit {
                code: output.status.code(),
                stderr: truncate_stderr(&output.stderr),
            })
        }
    }
}

impl Probe for CommandProbe {
    fn run(&self, timeout: Duration) -> ProbeFuture<'_> {
        Box::pin(self.execute(timeout))
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

fn truncate_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= MAX_STDERR_BYTES {
        return text.to_string();
    }
    let mut end = MAX_STDERR_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
