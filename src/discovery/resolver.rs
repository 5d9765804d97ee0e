//! Four-tier search that turns one manager handler into one [`ManagerStatus`].
//!
//! Tiers run strictly in order and stop at the first success:
//!
//! 1. run the bare executable with its version arguments
//! 2. scan the search-path directories for the executable file
//! 3. run the version check against each well-known install path
//! 4. run the version check against each user-configured path
//!
//! Tiers 1 and 2 yield `available`; tiers 3 and 4 yield `path_missing`.

use futures_util::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::status::{DiscoveryMethod, ManagerStatus};
use crate::managers::ManagerHandler;
use crate::probe::CommandProbe;
use crate::utils::fs::{find_executable_in, is_executable, search_path_from_env};
use crate::utils::Platform;

/// What the resolver knows about the machine it runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveEnv {
    pub search_path: Vec<PathBuf>,
    pub platform: Platform,
}

impl ResolveEnv {
    /// Snapshot of the current process's `PATH` and platform
    pub fn from_process() -> Self {
        Self {
            search_path: search_path_from_env(),
            platform: Platform::current(),
        }
    }
}

#[derive(Clone)]
pub struct TieredResolver {
    probe: Arc<dyn CommandProbe>,
    env: Arc<ResolveEnv>,
    probe_timeout: Duration,
    max_parallel_path_probes: usize,
}

impl TieredResolver {
    pub fn new(
        probe: Arc<dyn CommandProbe>,
        env: Arc<ResolveEnv>,
        probe_timeout: Duration,
        max_parallel_path_probes: usize,
    ) -> Self {
        Self {
            probe,
            env,
            probe_timeout,
            max_parallel_path_probes: max_parallel_path_probes.max(1),
        }
    }

    /// Resolve one manager; `custom_paths` are already expanded
    pub async fn resolve(
        &self,
        handler: &ManagerHandler,
        custom_paths: &[PathBuf],
    ) -> ManagerStatus {
        let manager = handler.id;

        // Tier 1
        let command = handler.version_command(&handler.executable);
        let outcome = self.probe.execute(&command, self.probe_timeout).await;
        if outcome.success {
            debug!("{}: found via direct command `{}`", manager, command);
            return ManagerStatus::found(
                manager,
                DiscoveryMethod::DirectCommand,
                PathBuf::from(&handler.executable),
            );
        }
        debug!(
            "{}: direct command failed (exit {:?}): {}",
            manager,
            outcome.exit_code,
            outcome.stderr.trim()
        );

        // Tier 2
        if let Some(path) =
            find_executable_in(&handler.executable, &self.env.search_path, self.env.platform)
        {
            debug!("{}: found on search path at {}", manager, path.display());
            return ManagerStatus::found(manager, DiscoveryMethod::PathScan, path);
        }
        debug!("{}: not found on search path", manager);

        // Tier 3
        let common = handler.common_paths_for(self.env.platform);
        if let Some(path) = self.first_working_path(handler, &common).await {
            return ManagerStatus::found(manager, DiscoveryMethod::CommonPath, path);
        }

        // Tier 4, minus anything tier 3 already tried
        let custom: Vec<PathBuf> = custom_paths
            .iter()
            .filter(|path| !common.contains(*path))
            .cloned()
            .collect();
        if let Some(path) = self.first_working_path(handler, &custom).await {
            return ManagerStatus::found(manager, DiscoveryMethod::CustomPath, path);
        }

        debug!("{}: not installed", manager);
        ManagerStatus::not_installed(manager)
    }

    /// First path, in declaration order, whose version check succeeds
    ///
    /// Paths missing from disk are skipped without spawning anything. At most
    /// `max_parallel_path_probes` checks are in flight at once, and any still
    /// running when a winner is found are dropped.
    async fn first_working_path(
        &self,
        handler: &ManagerHandler,
        candidates: &[PathBuf],
    ) -> Option<PathBuf> {
        let existing: Vec<PathBuf> = candidates
            .iter()
            .filter(|path| {
                let present = is_executable(path);
                if !present {
                    debug!("{}: skipping missing {}", handler.id, path.display());
                }
                present
            })
            .cloned()
            .collect();

        if existing.is_empty() {
            return None;
        }

        let mut attempts = stream::iter(existing.into_iter().map(|path| {
            let command = handler.version_command(&path);
            async move {
                let outcome = self.probe.execute(&command, self.probe_timeout).await;
                (path, outcome)
            }
        }))
        .buffered(self.max_parallel_path_probes);

        while let Some((path, outcome)) = attempts.next().await {
            if outcome.success {
                debug!("{}: version check passed at {}", handler.id, path.display());
                return Some(path);
            }
            debug!(
                "{}: version check failed at {}: {}",
                handler.id,
                path.display(),
                outcome.stderr.trim()
            );
        }

        None
    }
}
