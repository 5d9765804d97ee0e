use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod handler;
pub mod parsers;
pub mod registry;

pub use handler::{CommandTemplate, CommonPath, ManagerHandler, PackageParser, TemplateArg};
pub use registry::{builtin_handlers, ManagerRegistry, RegistryError};

/// The closed set of package managers devscope knows how to discover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerId {
    Brew,
    Npm,
    Pnpm,
    Yarn,
    Bun,
    Pip,
    Pipx,
    Uv,
    Poetry,
    Conda,
    Pyenv,
    Cargo,
    Gem,
}

impl ManagerId {
    pub const ALL: [ManagerId; 13] = [
        ManagerId::Brew,
        ManagerId::Npm,
        ManagerId::Pnpm,
        ManagerId::Yarn,
        ManagerId::Bun,
        ManagerId::Pip,
        ManagerId::Pipx,
        ManagerId::Uv,
        ManagerId::Poetry,
        ManagerId::Conda,
        ManagerId::Pyenv,
        ManagerId::Cargo,
        ManagerId::Gem,
    ];

    /// Canonical name used on the command line, in config files and in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerId::Brew => "brew",
            ManagerId::Npm => "npm",
            ManagerId::Pnpm => "pnpm",
            ManagerId::Yarn => "yarn",
            ManagerId::Bun => "bun",
            ManagerId::Pip => "pip",
            ManagerId::Pipx => "pipx",
            ManagerId::Uv => "uv",
            ManagerId::Poetry => "poetry",
            ManagerId::Conda => "conda",
            ManagerId::Pyenv => "pyenv",
            ManagerId::Cargo => "cargo",
            ManagerId::Gem => "gem",
        }
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown package manager: {name}")]
pub struct UnknownManagerError {
    pub name: String,
}

impl FromStr for ManagerId {
    type Err = UnknownManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let alias = match normalized.as_str() {
            "homebrew" => "brew",
            "pip3" => "pip",
            other => other,
        };

        ManagerId::ALL
            .into_iter()
            .find(|id| id.as_str() == alias)
            .ok_or(UnknownManagerError {
                name: s.to_string(),
            })
    }
}

/// A package reported by a manager's list command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub location: Option<String>,
    pub manager: ManagerId,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>, manager: ManagerId) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            location: None,
            manager,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for id in ManagerId::ALL {
            assert_eq!(id.as_str().parse::<ManagerId>().unwrap(), id);
        }
    }

    #[test]
    fn test_aliases_and_case() {
        assert_eq!("Homebrew".parse::<ManagerId>().unwrap(), ManagerId::Brew);
        assert_eq!(" PIP3 ".parse::<ManagerId>().unwrap(), ManagerId::Pip);
        assert_eq!("UV".parse::<ManagerId>().unwrap(), ManagerId::Uv);
    }

    #[test]
    fn test_unknown_manager() {
        let err = "apt-get".parse::<ManagerId>().unwrap_err();
        assert_eq!(err.name, "apt-get");
        assert!(err.to_string().contains("apt-get"));
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&ManagerId::Pyenv).unwrap();
        assert_eq!(json, "\"pyenv\"");
        let id: ManagerId = serde_yaml::from_str("conda").unwrap();
        assert_eq!(id, ManagerId::Conda);
    }
}
