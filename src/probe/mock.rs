//! Scripted probe for unit tests

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::{CommandProbe, CommandSpec, ProbeOutcome};

type Responder = Box<dyn Fn(&CommandSpec) -> ProbeOutcome + Send + Sync>;

/// Records every command and answers through a closure
pub(crate) struct MockProbe {
    calls: Mutex<Vec<CommandSpec>>,
    responder: Responder,
}

impl MockProbe {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CommandSpec) -> ProbeOutcome + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Every command fails, as on a machine with nothing installed
    pub fn failing() -> Self {
        Self::new(|_| ProbeOutcome::failed("not found"))
    }

    /// Succeeds only for the exact programs given (bare names or full paths)
    pub fn succeeding_for(programs: &[&str]) -> Self {
        let programs: Vec<String> = programs.iter().map(|p| p.to_string()).collect();
        Self::new(move |spec| {
            let program = spec.program.to_string_lossy();
            if programs.iter().any(|p| *p == program) {
                ProbeOutcome::succeeded("1.0.0\n")
            } else {
                ProbeOutcome::failed("not found")
            }
        })
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl CommandProbe for MockProbe {
    async fn execute(&self, command: &CommandSpec, _timeout: Duration) -> ProbeOutcome {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.clone());
        (self.responder)(command)
    }
}

/// Write a small shell script with the executable bit set
#[cfg(unix)]
pub(crate) fn write_executable(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "#!/bin/sh\necho 1.0.0\n").unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
