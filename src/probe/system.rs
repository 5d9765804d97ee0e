use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::trace;

use super::{CommandProbe, CommandSpec, ProbeOutcome};

/// Probe backed by real subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }

    fn build_command(spec: &CommandSpec) -> Command {
        // Bare names on Windows may be .cmd/.bat shims (npm, yarn, pnpm) that
        // only the shell knows how to launch
        if cfg!(windows) && spec.is_bare() {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&spec.program).args(&spec.args);
            cmd
        } else {
            let mut cmd = Command::new(&spec.program);
            cmd.args(&spec.args);
            cmd
        }
    }
}

#[async_trait]
impl CommandProbe for SystemProbe {
    async fn execute(&self, spec: &CommandSpec, timeout: Duration) -> ProbeOutcome {
        let mut cmd = Self::build_command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                trace!("Failed to spawn {}: {}", spec, e);
                return ProbeOutcome::failed(e.to_string());
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let outcome = ProbeOutcome {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    exit_code: output.status.code(),
                };
                trace!("{} exited with {:?}", spec, outcome.exit_code);
                outcome
            }
            Ok(Err(e)) => ProbeOutcome::failed(e.to_string()),
            // Dropping the wait future drops the child, and kill_on_drop reaps it
            Err(_) => {
                trace!("{} timed out after {:?}", spec, timeout);
                ProbeOutcome::timed_out(timeout)
            }
        }
    }
}
