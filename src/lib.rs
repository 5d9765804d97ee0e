//! devscope library
//!
//! Finds the package managers installed on a developer machine, tells whether
//! the shell can reach them, and lists or removes the packages they manage.

pub mod cache;
pub mod discovery;
pub mod managers;
pub mod output;
pub mod probe;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use cache::PathCache;
pub use discovery::{
    Availability, DiscoveryConfig, DiscoveryMethod, DiscoveryOrchestrator, ListingProgress,
    ManagerStatus, UninstallOptions,
};
pub use managers::{ManagerId, ManagerRegistry, PackageInfo};
pub use probe::{CommandProbe, CommandSpec, ProbeOutcome, SystemProbe};
