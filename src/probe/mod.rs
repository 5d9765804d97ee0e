//! Bounded subprocess execution used by every discovery tier.
//!
//! A [`CommandProbe`] never fails: spawn errors, non-zero exits and timeouts
//! all come back as a [`ProbeOutcome`] with `success == false`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
pub(crate) mod mock;
pub mod system;

pub use system::SystemProbe;

/// A program plus its argument vector
///
/// Commands are never assembled into shell strings, so package names and paths
/// cannot smuggle in extra shell syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program as a path, for tier checks that need to stat it first
    pub fn program_path(&self) -> &Path {
        Path::new(&self.program)
    }

    /// Whether the program is a bare name resolved through the search path
    pub fn is_bare(&self) -> bool {
        self.program_path().components().count() == 1 && !self.program_path().is_absolute()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Structured result of running a command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process never ran, was killed, or timed out
    pub exit_code: Option<i32>,
}

impl ProbeOutcome {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// The command could not be started or exited unsuccessfully
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: None,
        }
    }

    pub fn timed_out(after: Duration) -> Self {
        Self::failed(format!("timed out after {}ms", after.as_millis()))
    }

    pub fn is_timeout(&self) -> bool {
        !self.success && self.exit_code.is_none() && self.stderr.starts_with("timed out after")
    }
}

/// Executes commands with a bounded timeout and never errors
#[async_trait]
pub trait CommandProbe: Send + Sync {
    async fn execute(&self, command: &CommandSpec, timeout: Duration) -> ProbeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_display_quotes_whitespace() {
        let spec = CommandSpec::new("/opt/my tools/brew").with_args(["list", "--versions", ""]);
        assert_eq!(spec.to_string(), "/opt/my tools/brew list --versions \"\"");
    }

    #[test]
    fn test_bare_programs() {
        assert!(CommandSpec::new("brew").is_bare());
        assert!(!CommandSpec::new("/opt/homebrew/bin/brew").is_bare());
        assert!(!CommandSpec::new("bin/brew").is_bare());
    }

    #[test]
    fn test_timeout_outcome() {
        let outcome = ProbeOutcome::timed_out(Duration::from_secs(2));
        assert!(!outcome.success);
        assert!(outcome.is_timeout());
        assert!(outcome.stderr.contains("2000ms"));

        assert!(!ProbeOutcome::failed("No such file").is_timeout());
        assert!(!ProbeOutcome::succeeded("1.0").is_timeout());
    }
}
