//! Package manager discovery: where each manager lives and whether the shell
//! can reach it.

pub mod config;
pub mod custom_paths;
pub mod error;
pub mod orchestrator;
pub mod resolver;
pub mod status;

pub use config::{default_config_path, DiscoveryConfig, CONFIG_ENV_VAR};
pub use custom_paths::{load_custom_paths, CustomPaths};
pub use error::DiscoveryError;
pub use orchestrator::{DiscoveryOrchestrator, ListingProgress, UninstallOptions};
pub use resolver::{ResolveEnv, TieredResolver};
pub use status::{Availability, DiscoveryMethod, ManagerStatus};
