//! Status taxonomy produced by the tiered resolver.
//!
//! `ManagerStatus` can only be built through [`ManagerStatus::found`] and
//! [`ManagerStatus::not_installed`], which keeps `status`, `in_path`,
//! `discovery_method` and `message` consistent with each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::managers::ManagerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    PathMissing,
    NotInstalled,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Availability::Available => "available",
            Availability::PathMissing => "path missing",
            Availability::NotInstalled => "not installed",
        })
    }
}

/// Which tier located the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    DirectCommand,
    PathScan,
    CommonPath,
    CustomPath,
}

impl DiscoveryMethod {
    /// Tiers 1 and 2 find binaries reachable through the search path
    pub fn is_in_path(&self) -> bool {
        matches!(self, DiscoveryMethod::DirectCommand | DiscoveryMethod::PathScan)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMethod::DirectCommand => "direct_command",
            DiscoveryMethod::PathScan => "path_scan",
            DiscoveryMethod::CommonPath => "common_path",
            DiscoveryMethod::CustomPath => "custom_path",
        }
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStatus {
    manager: ManagerId,
    status: Availability,
    in_path: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovery_method: Option<DiscoveryMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

impl ManagerStatus {
    /// A manager located by `method`; the availability follows from the tier
    pub fn found(manager: ManagerId, method: DiscoveryMethod, path: PathBuf) -> Self {
        if method.is_in_path() {
            return Self {
                manager,
                status: Availability::Available,
                in_path: true,
                discovery_method: Some(method),
                message: None,
                path: Some(path),
            };
        }

        let hint = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                format!(" Add {} to your PATH to use it from a shell.", dir.display())
            }
            _ => String::new(),
        };

        Self {
            manager,
            status: Availability::PathMissing,
            in_path: false,
            discovery_method: Some(method),
            message: Some(format!(
                "{} was found at {} but is not in PATH.{}",
                manager,
                path.display(),
                hint
            )),
            path: Some(path),
        }
    }

    pub fn not_installed(manager: ManagerId) -> Self {
        Self {
            manager,
            status: Availability::NotInstalled,
            in_path: false,
            discovery_method: None,
            message: None,
            path: None,
        }
    }

    pub fn manager(&self) -> ManagerId {
        self.manager
    }

    pub fn status(&self) -> Availability {
        self.status
    }

    pub fn in_path(&self) -> bool {
        self.in_path
    }

    pub fn discovery_method(&self) -> Option<DiscoveryMethod> {
        self.discovery_method
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Executable that answered the version check: a bare name for the
    /// direct-command tier, an absolute path otherwise
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether listing and uninstall may proceed
    pub fn is_usable(&self) -> bool {
        self.status != Availability::NotInstalled
    }

    /// Verify the field relationships every status must satisfy
    pub fn check_invariants(&self) -> Result<(), String> {
        let method_in_path = self.discovery_method.map(|m| m.is_in_path());

        match self.status {
            Availability::Available => {
                if !self.in_path {
                    return Err(format!("{}: available but in_path is false", self.manager));
                }
                if method_in_path != Some(true) {
                    return Err(format!(
                        "{}: available with discovery method {:?}",
                        self.manager, self.discovery_method
                    ));
                }
            }
            Availability::PathMissing => {
                if self.in_path {
                    return Err(format!("{}: path_missing but in_path is true", self.manager));
                }
                if method_in_path != Some(false) {
                    return Err(format!(
                        "{}: path_missing with discovery method {:?}",
                        self.manager, self.discovery_method
                    ));
                }
                match &self.message {
                    Some(message) if message.contains("not in PATH") => {}
                    _ => {
                        return Err(format!(
                            "{}: path_missing without a PATH hint",
                            self.manager
                        ))
                    }
                }
            }
            Availability::NotInstalled => {
                if self.in_path || self.discovery_method.is_some() || self.path.is_some() {
                    return Err(format!(
                        "{}: not_installed carries discovery details",
                        self.manager
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_path_tiers_are_available() {
        for method in [DiscoveryMethod::DirectCommand, DiscoveryMethod::PathScan] {
            let status = ManagerStatus::found(ManagerId::Npm, method, PathBuf::from("npm"));
            assert_eq!(status.status(), Availability::Available);
            assert!(status.in_path());
            assert_eq!(status.discovery_method(), Some(method));
            assert!(status.message().is_none());
            assert!(status.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_off_path_tiers_are_path_missing_with_hint() {
        for method in [DiscoveryMethod::CommonPath, DiscoveryMethod::CustomPath] {
            let status = ManagerStatus::found(
                ManagerId::Brew,
                method,
                PathBuf::from("/opt/homebrew/bin/brew"),
            );
            assert_eq!(status.status(), Availability::PathMissing);
            assert!(!status.in_path());
            let message = status.message().unwrap();
            assert!(message.contains("not in PATH"));
            assert!(message.contains("/opt/homebrew/bin"));
            assert!(status.check_invariants().is_ok());
            assert!(status.is_usable());
        }
    }

    #[test]
    fn test_not_installed_is_bare() {
        let status = ManagerStatus::not_installed(ManagerId::Gem);
        assert_eq!(status.status(), Availability::NotInstalled);
        assert!(!status.in_path());
        assert!(status.discovery_method().is_none());
        assert!(status.message().is_none());
        assert!(status.path().is_none());
        assert!(!status.is_usable());
        assert!(status.check_invariants().is_ok());
    }

    #[test]
    fn test_serializes_snake_case_and_skips_absent_fields() {
        let status = ManagerStatus::found(
            ManagerId::Uv,
            DiscoveryMethod::CustomPath,
            PathBuf::from("/tools/uv"),
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["manager"], "uv");
        assert_eq!(json["status"], "path_missing");
        assert_eq!(json["in_path"], false);
        assert_eq!(json["discovery_method"], "custom_path");

        let json = serde_json::to_value(ManagerStatus::not_installed(ManagerId::Uv)).unwrap();
        assert_eq!(json["status"], "not_installed");
        assert!(json.get("discovery_method").is_none());
        assert!(json.get("message").is_none());
    }
}
