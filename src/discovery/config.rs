use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV_VAR: &str = "DEVSCOPE_CONFIG";

/// Config location: `$DEVSCOPE_CONFIG` when set, else `~/.devscope/config.yaml`
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devscope")
        .join("config.yaml")
}

/// Tunables for probing and caching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Upper bound for each tier's version check
    pub probe_timeout_secs: u64,
    pub list_timeout_secs: u64,
    pub uninstall_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    /// How many common/custom paths of one manager are probed at once
    pub max_parallel_path_probes: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
            list_timeout_secs: 60,
            uninstall_timeout_secs: 300,
            cache_ttl_secs: 300,
            max_parallel_path_probes: 4,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    discovery: DiscoveryConfig,
}

impl DiscoveryConfig {
    /// Load the `discovery` section; a missing file yields the defaults
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: ConfigFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(file.discovery.normalized())
    }

    // Zero timeouts would make every probe fail and zero parallelism would
    // stall tiers 3 and 4
    fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.probe_timeout_secs == 0 {
            self.probe_timeout_secs = defaults.probe_timeout_secs;
        }
        if self.list_timeout_secs == 0 {
            self.list_timeout_secs = defaults.list_timeout_secs;
        }
        if self.uninstall_timeout_secs == 0 {
            self.uninstall_timeout_secs = defaults.uninstall_timeout_secs;
        }
        self.max_parallel_path_probes = self.max_parallel_path_probes.max(1);
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }

    pub fn uninstall_timeout(&self) -> Duration {
        Duration::from_secs(self.uninstall_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
