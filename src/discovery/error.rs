use crate::managers::{ManagerId, UnknownManagerError};

/// Failures inside discovery, listing and uninstall paths
///
/// None of these cross the orchestrator's public methods; they are logged and
/// folded into statuses, empty lists or `false`.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    UnknownManager(#[from] UnknownManagerError),

    #[error("{manager} is not installed")]
    NotInstalled { manager: ManagerId },

    #[error("Listing packages for {manager} failed: {message}")]
    ListFailed { manager: ManagerId, message: String },

    #[error("Invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },

    #[error("Uninstalling {package} with {manager} failed: {message}")]
    UninstallFailed {
        package: String,
        manager: ManagerId,
        message: String,
    },

    #[error("Background task for {manager} failed: {message}")]
    TaskFailed { manager: ManagerId, message: String },
}
