//! Catalog-wide discovery plus the package operations gated on it.
//!
//! Every public method here has a total contract: failures inside one
//! manager's resolution, listing or uninstall are logged and come back as
//! data (`not_installed`, an empty list, `false`), never as errors.

use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::{default_config_path, DiscoveryConfig};
use super::custom_paths::{load_custom_paths, resolve_custom_paths, CustomPaths};
use super::error::DiscoveryError;
use super::resolver::{ResolveEnv, TieredResolver};
use super::status::{Availability, ManagerStatus};
use crate::cache::PathCache;
use crate::managers::handler::validate_package_name;
use crate::managers::{ManagerHandler, ManagerId, ManagerRegistry, PackageInfo};
use crate::probe::{CommandProbe, CommandSpec, ProbeOutcome};

/// Per-manager events emitted by [`DiscoveryOrchestrator::list_all_packages`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingProgress {
    Started,
    Completed { count: usize },
    Failed { reason: String },
    /// The manager was not listed because of its status
    Skipped { status: Availability },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Append the manager's force arguments
    pub force: bool,
    /// Log the command instead of running it
    pub dry_run: bool,
}

struct Inner {
    registry: ManagerRegistry,
    cache: Arc<PathCache>,
    probe: Arc<dyn CommandProbe>,
    resolver: TieredResolver,
    config: DiscoveryConfig,
    custom_paths: RwLock<CustomPaths>,
}

/// Resolves the whole manager catalog and runs package operations
///
/// Cloning is cheap; clones share the cache, probe and custom paths.
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    inner: Arc<Inner>,
}

impl DiscoveryOrchestrator {
    pub fn new(
        registry: ManagerRegistry,
        cache: Arc<PathCache>,
        probe: Arc<dyn CommandProbe>,
        config: DiscoveryConfig,
    ) -> Self {
        Self::with_env(registry, cache, probe, config, ResolveEnv::from_process())
    }

    /// Construct against an explicit search path and platform
    pub fn with_env(
        registry: ManagerRegistry,
        cache: Arc<PathCache>,
        probe: Arc<dyn CommandProbe>,
        config: DiscoveryConfig,
        env: ResolveEnv,
    ) -> Self {
        let resolver = TieredResolver::new(
            Arc::clone(&probe),
            Arc::new(env),
            config.probe_timeout(),
            config.max_parallel_path_probes,
        );

        Self {
            inner: Arc::new(Inner {
                registry,
                cache,
                probe,
                resolver,
                config,
                custom_paths: RwLock::new(CustomPaths::new()),
            }),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &PathCache {
        &self.inner.cache
    }

    /// The closed set of supported managers, in catalog order
    pub fn get_registered_managers(&self) -> Vec<ManagerId> {
        self.inner.registry.managers()
    }

    pub fn get_handler(&self, manager: ManagerId) -> Option<&ManagerHandler> {
        self.inner.registry.get(manager)
    }

    /// Currently loaded custom path templates
    pub fn custom_paths(&self) -> CustomPaths {
        self.read_custom_paths().clone()
    }

    fn read_custom_paths(&self) -> RwLockReadGuard<'_, CustomPaths> {
        self.inner
            .custom_paths
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Status of every registered manager, one entry each, in catalog order
    pub async fn discover_available_managers(&self) -> Vec<ManagerStatus> {
        let managers = self.get_registered_managers();
        debug!("Discovering {} package managers", managers.len());

        let statuses = join_all(
            managers
                .into_iter()
                .map(|manager| self.get_manager_status(manager)),
        )
        .await;

        let available = statuses
            .iter()
            .filter(|s| s.status() == Availability::Available)
            .count();
        let path_missing = statuses
            .iter()
            .filter(|s| s.status() == Availability::PathMissing)
            .count();
        info!(
            "Discovered {} managers: {} available, {} outside PATH",
            statuses.len(),
            available,
            path_missing
        );

        statuses
    }

    /// Cached status for one manager, resolving on a miss
    pub async fn get_manager_status(&self, manager: ManagerId) -> ManagerStatus {
        if let Some(status) = self.inner.cache.get(&manager) {
            debug!("{}: using cached status ({})", manager, status.status());
            return status;
        }

        match self.resolve_isolated(manager).await {
            Ok(status) => {
                self.inner.cache.set_with_ttl(
                    manager,
                    status.clone(),
                    self.inner.config.cache_ttl(),
                );
                status
            }
            Err(e) => {
                warn!("{}", e);
                ManagerStatus::not_installed(manager)
            }
        }
    }

    /// Status for a manager given by name; `None` when the name is not a
    /// supported manager
    pub async fn status_by_name(&self, name: &str) -> Option<ManagerStatus> {
        match name.parse::<ManagerId>().map_err(DiscoveryError::from) {
            Ok(manager) => Some(self.get_manager_status(manager).await),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Run the tiered resolver in its own task so a panic stays contained
    async fn resolve_isolated(&self, manager: ManagerId) -> Result<ManagerStatus, DiscoveryError> {
        let handler = self
            .inner
            .registry
            .get(manager)
            .cloned()
            .ok_or(DiscoveryError::NotInstalled { manager })?;
        let custom = resolve_custom_paths(&self.read_custom_paths(), manager);
        let resolver = self.inner.resolver.clone();

        tokio::spawn(async move { resolver.resolve(&handler, &custom).await })
            .await
            .map_err(|e| DiscoveryError::TaskFailed {
                manager,
                message: e.to_string(),
            })
    }

    /// Drop cached statuses and discover everything again
    pub async fn refresh_all(&self) -> Vec<ManagerStatus> {
        self.clear_cache();
        self.discover_available_managers().await
    }

    pub fn clear_cache(&self) {
        let dropped = self.inner.cache.size();
        self.inner.cache.clear();
        debug!("Cleared {} cached manager statuses", dropped);
    }

    /// Load custom paths from `~/.devscope/config.yaml`
    pub async fn load_custom_config(&self) -> usize {
        self.load_custom_config_from(&default_config_path()).await
    }

    /// Load custom paths from `path`, returning how many were loaded
    ///
    /// A missing, empty or malformed file leaves no custom paths configured.
    /// Cached statuses are dropped when the loaded paths change.
    pub async fn load_custom_config_from(&self, path: &Path) -> usize {
        let loaded = load_custom_paths(path).await;
        let count = loaded.values().map(Vec::len).sum();

        let changed = {
            let mut current = self
                .inner
                .custom_paths
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let changed = *current != loaded;
            *current = loaded;
            changed
        };

        if changed {
            info!("Loaded {} custom paths from {}", count, path.display());
            self.clear_cache();
        }

        count
    }

    /// Installed packages for one manager; empty when it is not installed or
    /// the listing fails
    pub async fn list_packages(&self, manager: ManagerId) -> Vec<PackageInfo> {
        let status = self.get_manager_status(manager).await;
        if !status.is_usable() {
            debug!("{}: not installed, nothing to list", manager);
            return Vec::new();
        }

        match self.run_listing(&status).await {
            Ok(packages) => packages,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }

    /// Packages of every usable manager, listed concurrently
    ///
    /// `on_progress` is called from the caller's task as each manager's
    /// listing starts and finishes. Failed listings contribute nothing.
    pub async fn list_all_packages<F>(&self, mut on_progress: F) -> Vec<PackageInfo>
    where
        F: FnMut(ManagerId, ListingProgress),
    {
        let statuses = self.discover_available_managers().await;
        let mut pending = FuturesUnordered::new();

        for status in statuses {
            let manager = status.manager();
            if !status.is_usable() {
                on_progress(
                    manager,
                    ListingProgress::Skipped {
                        status: status.status(),
                    },
                );
                continue;
            }

            on_progress(manager, ListingProgress::Started);
            let this = self.clone();
            pending.push(async move { (manager, this.run_listing(&status).await) });
        }

        let mut packages = Vec::new();
        while let Some((manager, result)) = pending.next().await {
            match result {
                Ok(listed) => {
                    on_progress(
                        manager,
                        ListingProgress::Completed {
                            count: listed.len(),
                        },
                    );
                    packages.extend(listed);
                }
                Err(e) => {
                    warn!("{}", e);
                    on_progress(
                        manager,
                        ListingProgress::Failed {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        packages.sort_by(|a, b| (a.manager, &a.name).cmp(&(b.manager, &b.name)));
        packages
    }

    async fn run_listing(&self, status: &ManagerStatus) -> Result<Vec<PackageInfo>, DiscoveryError> {
        let manager = status.manager();
        let handler = self.handler_for(manager)?.clone();
        let command = handler.list_command_for(&program_for(&handler, status))?;
        let location = status
            .path()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.display().to_string());
        let probe = Arc::clone(&self.inner.probe);
        let timeout = self.inner.config.list_timeout();

        debug!("{}: listing packages with `{}`", manager, command);
        let task = tokio::spawn(async move {
            let outcome = probe.execute(&command, timeout).await;
            if !outcome.success {
                return Err(DiscoveryError::ListFailed {
                    manager,
                    message: failure_reason(&outcome),
                });
            }

            let mut packages = handler.parse_list_output(&outcome.stdout);
            if let Some(location) = location {
                for package in packages.iter_mut().filter(|p| p.location.is_none()) {
                    package.location = Some(location.clone());
                }
            }
            Ok(packages)
        });

        task.await.map_err(|e| DiscoveryError::TaskFailed {
            manager,
            message: e.to_string(),
        })?
    }

    /// Remove `package` through `manager`; `false` on any failure
    pub async fn uninstall_package(
        &self,
        package: &str,
        manager: ManagerId,
        options: UninstallOptions,
    ) -> bool {
        match self.try_uninstall(package, manager, options).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    async fn try_uninstall(
        &self,
        package: &str,
        manager: ManagerId,
        options: UninstallOptions,
    ) -> Result<(), DiscoveryError> {
        validate_package_name(package)?;

        let status = self.get_manager_status(manager).await;
        if !status.is_usable() {
            return Err(DiscoveryError::NotInstalled { manager });
        }

        let handler = self.handler_for(manager)?;
        let command = handler.uninstall_command_for(
            &program_for(handler, &status),
            package,
            options.force,
        )?;

        if options.dry_run {
            info!("Dry run, would run `{}`", command);
            return Ok(());
        }

        info!("Uninstalling {} with `{}`", package, command);
        let outcome = self
            .run_detached(manager, command, self.inner.config.uninstall_timeout())
            .await?;

        if outcome.success {
            info!("Uninstalled {} from {}", package, manager);
            Ok(())
        } else {
            Err(DiscoveryError::UninstallFailed {
                package: package.to_string(),
                manager,
                message: failure_reason(&outcome),
            })
        }
    }

    async fn run_detached(
        &self,
        manager: ManagerId,
        command: CommandSpec,
        timeout: Duration,
    ) -> Result<ProbeOutcome, DiscoveryError> {
        let probe = Arc::clone(&self.inner.probe);
        tokio::spawn(async move { probe.execute(&command, timeout).await })
            .await
            .map_err(|e| DiscoveryError::TaskFailed {
                manager,
                message: e.to_string(),
            })
    }

    fn handler_for(&self, manager: ManagerId) -> Result<&ManagerHandler, DiscoveryError> {
        self.inner
            .registry
            .get(manager)
            .ok_or(DiscoveryError::NotInstalled { manager })
    }
}

/// The executable that passed discovery, so off-PATH managers still work
fn program_for(handler: &ManagerHandler, status: &ManagerStatus) -> OsString {
    status
        .path()
        .map(|path| path.as_os_str().to_owned())
        .unwrap_or_else(|| OsString::from(&handler.executable))
}

fn failure_reason(outcome: &ProbeOutcome) -> String {
    let stderr = outcome.stderr.trim();
    match (outcome.exit_code, stderr.is_empty()) {
        (Some(code), true) => format!("exit code {code}"),
        (Some(code), false) => format!("exit code {code}: {stderr}"),
        (None, true) => "command did not complete".to_string(),
        (None, false) => stderr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::mock::MockProbe;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn orchestrator(probe: Arc<MockProbe>) -> DiscoveryOrchestrator {
        let env = ResolveEnv {
            search_path: Vec::new(),
            platform: crate::utils::Platform::current(),
        };
        DiscoveryOrchestrator::with_env(
            ManagerRegistry::builtin(),
            Arc::new(PathCache::new()),
            probe,
            DiscoveryConfig::default(),
            env,
        )
    }

    fn is_version_check(spec: &CommandSpec) -> bool {
        spec.args == ["--version"]
    }

    /// npm and cargo installed; npm lists one package, cargo's listing fails
    fn npm_and_cargo() -> Arc<MockProbe> {
        Arc::new(MockProbe::new(|spec| {
            let program = spec.program.to_string_lossy().into_owned();
            match (program.as_str(), is_version_check(spec)) {
                ("npm" | "cargo", true) => ProbeOutcome::succeeded("1.0.0\n"),
                ("npm", false) if spec.args.first().map(String::as_str) == Some("ls") => {
                    ProbeOutcome::succeeded(
                        r#"{"dependencies":{"typescript":{"version":"5.4.5"}}}"#,
                    )
                }
                ("npm", false) => ProbeOutcome::succeeded(""),
                (_, _) => ProbeOutcome::failed("boom"),
            }
        }))
    }

    #[tokio::test]
    async fn test_discovery_covers_every_registered_manager() {
        let discovery = orchestrator(Arc::new(MockProbe::failing()));
        let statuses = discovery.discover_available_managers().await;

        assert_eq!(statuses.len(), discovery.get_registered_managers().len());
        assert_eq!(statuses.len(), ManagerId::ALL.len());
        for status in &statuses {
            assert_eq!(status.status(), Availability::NotInstalled);
            assert!(status.check_invariants().is_ok());
        }
    }

    #[tokio::test]
    async fn test_panicking_probe_only_affects_its_manager() {
        let probe = Arc::new(MockProbe::new(|spec| {
            match &*spec.program.to_string_lossy() {
                "pip3" => panic!("probe exploded"),
                "npm" | "cargo" => ProbeOutcome::succeeded("1.0.0\n"),
                _ => ProbeOutcome::failed("not found"),
            }
        }));
        let discovery = orchestrator(probe);

        let statuses = discovery.discover_available_managers().await;
        assert_eq!(statuses.len(), ManagerId::ALL.len());

        for status in &statuses {
            let expected = match status.manager() {
                ManagerId::Npm | ManagerId::Cargo => Availability::Available,
                _ => Availability::NotInstalled,
            };
            assert_eq!(status.status(), expected, "{}", status.manager());
            assert!(status.check_invariants().is_ok());
        }

        // A crashed resolution is not remembered
        assert!(discovery.cache().get(&ManagerId::Pip).is_none());
        assert!(discovery.cache().get(&ManagerId::Npm).is_some());
    }

    #[tokio::test]
    async fn test_second_lookup_within_ttl_does_not_probe() {
        let probe = Arc::new(MockProbe::succeeding_for(&["npm"]));
        let discovery = orchestrator(probe.clone());

        let first = discovery.get_manager_status(ManagerId::Npm).await;
        let after_first = probe.call_count();
        let second = discovery.get_manager_status(ManagerId::Npm).await;

        assert_eq!(first, second);
        assert_eq!(after_first, 1);
        assert_eq!(probe.call_count(), after_first);
    }

    #[tokio::test]
    async fn test_clear_cache_reproduces_the_same_statuses() {
        let probe = npm_and_cargo();
        let discovery = orchestrator(probe.clone());

        let before = discovery.discover_available_managers().await;
        let calls_before = probe.call_count();
        discovery.clear_cache();
        discovery.clear_cache();
        assert_eq!(discovery.cache().size(), 0);

        let after = discovery.refresh_all().await;
        assert_eq!(before, after);
        assert!(probe.call_count() > calls_before);
    }

    #[tokio::test]
    async fn test_listing_is_gated_on_installation() {
        let probe = Arc::new(MockProbe::failing());
        let discovery = orchestrator(probe.clone());

        assert!(discovery.list_packages(ManagerId::Brew).await.is_empty());
        assert!(probe.calls().iter().all(is_version_check));
    }

    #[tokio::test]
    async fn test_list_packages_parses_output() {
        let discovery = orchestrator(npm_and_cargo());

        let packages = discovery.list_packages(ManagerId::Npm).await;
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "typescript");
        assert_eq!(packages[0].version, "5.4.5");
        assert_eq!(packages[0].manager, ManagerId::Npm);
        // Found by bare name, so there is no directory to report
        assert!(packages[0].location.is_none());
    }

    #[tokio::test]
    async fn test_failed_listing_is_empty() {
        let discovery = orchestrator(npm_and_cargo());
        assert!(discovery.list_packages(ManagerId::Cargo).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_all_reports_progress_and_keeps_partial_results() {
        let discovery = orchestrator(npm_and_cargo());
        let events: Mutex<Vec<(ManagerId, ListingProgress)>> = Mutex::new(Vec::new());

        let packages = discovery
            .list_all_packages(|manager, progress| events.lock().unwrap().push((manager, progress)))
            .await;

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "typescript");

        let events = events.into_inner().unwrap();
        let for_manager = |id: ManagerId| -> Vec<ListingProgress> {
            events
                .iter()
                .filter(|(m, _)| *m == id)
                .map(|(_, p)| p.clone())
                .collect()
        };

        assert_eq!(
            for_manager(ManagerId::Npm),
            vec![ListingProgress::Started, ListingProgress::Completed { count: 1 }]
        );
        let cargo = for_manager(ManagerId::Cargo);
        assert_eq!(cargo.len(), 2);
        assert_eq!(cargo[0], ListingProgress::Started);
        assert!(matches!(&cargo[1], ListingProgress::Failed { reason } if reason.contains("cargo")));
        assert_eq!(
            for_manager(ManagerId::Gem),
            vec![ListingProgress::Skipped {
                status: Availability::NotInstalled
            }]
        );
        assert_eq!(events.len(), 2 + 2 + (ManagerId::ALL.len() - 2));
    }

    #[tokio::test]
    async fn test_uninstall_runs_structured_command() {
        let probe = npm_and_cargo();
        let discovery = orchestrator(probe.clone());

        let removed = discovery
            .uninstall_package("left-pad", ManagerId::Npm, UninstallOptions::default())
            .await;
        assert!(removed);

        let last = probe.calls().pop().unwrap();
        assert_eq!(last.program, OsString::from("npm"));
        assert_eq!(last.args, vec!["uninstall", "-g", "left-pad"]);

        let forced = UninstallOptions {
            force: true,
            dry_run: false,
        };
        assert!(discovery.uninstall_package("left-pad", ManagerId::Npm, forced).await);
        let last = probe.calls().pop().unwrap();
        assert_eq!(last.args, vec!["uninstall", "-g", "left-pad", "--force"]);
    }

    #[tokio::test]
    async fn test_uninstall_refusals_return_false() {
        let probe = npm_and_cargo();
        let discovery = orchestrator(probe.clone());
        let options = UninstallOptions::default();

        // Invalid names never reach a process
        assert!(!discovery.uninstall_package("", ManagerId::Npm, options).await);
        assert!(!discovery.uninstall_package("--global", ManagerId::Npm, options).await);
        assert!(!discovery.uninstall_package("a b", ManagerId::Npm, options).await);
        assert!(!discovery.uninstall_package("left-pad&calc", ManagerId::Npm, options).await);
        assert_eq!(probe.call_count(), 0);

        // Not installed
        assert!(!discovery.uninstall_package("rails", ManagerId::Gem, options).await);
        assert!(probe.calls().iter().all(is_version_check));

        // Installed, but the command fails
        assert!(!discovery.uninstall_package("ripgrep", ManagerId::Cargo, options).await);
    }

    #[tokio::test]
    async fn test_dry_run_spawns_nothing() {
        let probe = npm_and_cargo();
        let discovery = orchestrator(probe.clone());
        let options = UninstallOptions {
            force: false,
            dry_run: true,
        };

        assert!(discovery.uninstall_package("left-pad", ManagerId::Npm, options).await);
        assert!(probe.calls().iter().all(is_version_check));
        assert!(!discovery.uninstall_package("left-pad", ManagerId::Gem, options).await);
    }

    #[tokio::test]
    async fn test_load_custom_config_never_fails() {
        let dir = TempDir::new().unwrap();
        let discovery = orchestrator(Arc::new(MockProbe::failing()));

        assert_eq!(discovery.load_custom_config_from(&dir.path().join("missing.yaml")).await, 0);

        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "").unwrap();
        assert_eq!(discovery.load_custom_config_from(&empty).await, 0);

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "custom_paths: {brew: [").unwrap();
        assert_eq!(discovery.load_custom_config_from(&broken).await, 0);
        assert!(discovery.custom_paths().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_custom_paths_feed_the_last_tier() {
        use crate::discovery::status::DiscoveryMethod;
        use crate::probe::mock::write_executable;

        let dir = TempDir::new().unwrap();
        let uv = dir.path().join("tools/uv");
        write_executable(&uv);
        let uv_str = uv.to_str().unwrap().to_string();

        let config = dir.path().join("config.yaml");
        std::fs::write(&config, format!("custom_paths:\n  uv: [\"{uv_str}\"]\n")).unwrap();

        let probe = Arc::new(MockProbe::succeeding_for(&[uv_str.as_str()]));
        let discovery = orchestrator(probe);

        let before = discovery.get_manager_status(ManagerId::Uv).await;
        assert_eq!(before.status(), Availability::NotInstalled);

        assert_eq!(discovery.load_custom_config_from(&config).await, 1);
        assert_eq!(discovery.custom_paths()[&ManagerId::Uv], vec![uv_str.clone()]);

        // Loading new paths invalidates the cached not_installed result
        let after = discovery.get_manager_status(ManagerId::Uv).await;
        assert_eq!(after.status(), Availability::PathMissing);
        assert_eq!(after.discovery_method(), Some(DiscoveryMethod::CustomPath));
        assert_eq!(after.path(), Some(PathBuf::from(&uv_str).as_path()));
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_applicable() {
        let probe = Arc::new(MockProbe::succeeding_for(&["npm"]));
        let discovery = orchestrator(probe.clone());

        assert!(discovery.status_by_name("zypper").await.is_none());
        assert_eq!(probe.call_count(), 0);

        let status = discovery.status_by_name("NPM").await.unwrap();
        assert_eq!(status.status(), Availability::Available);
    }

    #[test]
    fn test_failure_reason_formats() {
        assert_eq!(
            failure_reason(&ProbeOutcome {
                success: false,
                stdout: String::new(),
                stderr: "  no such package \n".into(),
                exit_code: Some(2),
            }),
            "exit code 2: no such package"
        );
        assert_eq!(
            failure_reason(&ProbeOutcome::timed_out(Duration::from_secs(1))),
            "timed out after 1000ms"
        );
    }
}
