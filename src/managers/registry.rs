use std::collections::HashMap;

use super::handler::ManagerHandler;
use super::parsers;
use super::ManagerId;
use crate::utils::Platform;

const UNIX: &[Platform] = &[Platform::MacOS, Platform::Linux];
const MACOS: &[Platform] = &[Platform::MacOS];
const LINUX: &[Platform] = &[Platform::Linux];
const WINDOWS: &[Platform] = &[Platform::Windows];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("No handler registered for package manager '{manager}'")]
    MissingHandler { manager: ManagerId },

    #[error("More than one handler registered for package manager '{manager}'")]
    DuplicateHandler { manager: ManagerId },
}

/// Exhaustive mapping from every [`ManagerId`] to its handler
///
/// Immutable once built; construction fails unless the catalog is complete.
#[derive(Debug, Clone)]
pub struct ManagerRegistry {
    handlers: HashMap<ManagerId, ManagerHandler>,
}

impl ManagerRegistry {
    /// Build a registry, requiring exactly one handler per manager
    pub fn from_handlers(handlers: Vec<ManagerHandler>) -> Result<Self, RegistryError> {
        let mut map = HashMap::with_capacity(handlers.len());

        for handler in handlers {
            let manager = handler.id;
            if map.insert(manager, handler).is_some() {
                return Err(RegistryError::DuplicateHandler { manager });
            }
        }

        if let Some(manager) = ManagerId::ALL.into_iter().find(|id| !map.contains_key(id)) {
            return Err(RegistryError::MissingHandler { manager });
        }

        Ok(Self { handlers: map })
    }

    /// The built-in catalog
    ///
    /// `builtin_handlers` lists every manager exactly once; the tests below
    /// hold it to the same checks as `from_handlers`.
    pub fn builtin() -> Self {
        Self {
            handlers: builtin_handlers()
                .into_iter()
                .map(|handler| (handler.id, handler))
                .collect(),
        }
    }

    pub fn get(&self, manager: ManagerId) -> Option<&ManagerHandler> {
        self.handlers.get(&manager)
    }

    /// Registered managers in catalog order
    pub fn managers(&self) -> Vec<ManagerId> {
        ManagerId::ALL
            .into_iter()
            .filter(|id| self.handlers.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Handlers for every supported package manager
pub fn builtin_handlers() -> Vec<ManagerHandler> {
    vec![
        // System package manager
        ManagerHandler::new(ManagerId::Brew, "Homebrew")
            .with_common_path("/opt/homebrew/bin/brew", MACOS)
            .with_common_path("/usr/local/bin/brew", MACOS)
            .with_common_path("/home/linuxbrew/.linuxbrew/bin/brew", LINUX)
            .with_common_path("~/.linuxbrew/bin/brew", LINUX)
            .with_list_command(&["list", "--versions"])
            .with_uninstall_command(&["uninstall", "{package}"])
            .with_force_args(&["--force"])
            .with_parser(parsers::parse_brew),
        // JavaScript
        ManagerHandler::new(ManagerId::Npm, "npm")
            .with_common_path("/opt/homebrew/bin/npm", MACOS)
            .with_common_path("/usr/local/bin/npm", UNIX)
            .with_common_path("/usr/bin/npm", LINUX)
            .with_common_path("~/.volta/bin/npm", UNIX)
            .with_common_path("${ProgramFiles}/nodejs/npm.cmd", WINDOWS)
            .with_common_path("${APPDATA}/npm/npm.cmd", WINDOWS)
            .with_list_command(&["ls", "-g", "--depth=0", "--json"])
            .with_uninstall_command(&["uninstall", "-g", "{package}"])
            .with_force_args(&["--force"])
            .with_parser(parsers::parse_npm_json),
        ManagerHandler::new(ManagerId::Pnpm, "pnpm")
            .with_common_path("~/Library/pnpm/pnpm", MACOS)
            .with_common_path("/opt/homebrew/bin/pnpm", MACOS)
            .with_common_path("~/.local/share/pnpm/pnpm", LINUX)
            .with_common_path("/usr/local/bin/pnpm", UNIX)
            .with_common_path("${LOCALAPPDATA}/pnpm/pnpm.exe", WINDOWS)
            .with_list_command(&["ls", "-g", "--depth=0", "--json"])
            .with_uninstall_command(&["remove", "-g", "{package}"])
            .with_parser(parsers::parse_pnpm_json),
        ManagerHandler::new(ManagerId::Yarn, "Yarn")
            .with_common_path("~/.yarn/bin/yarn", UNIX)
            .with_common_path("/opt/homebrew/bin/yarn", MACOS)
            .with_common_path("/usr/local/bin/yarn", UNIX)
            .with_common_path("${APPDATA}/npm/yarn.cmd", WINDOWS)
            .with_list_command(&["global", "list"])
            .with_uninstall_command(&["global", "remove", "{package}"])
            .with_parser(parsers::parse_yarn),
        ManagerHandler::new(ManagerId::Bun, "Bun")
            .with_common_path("~/.bun/bin/bun", UNIX)
            .with_common_path("/opt/homebrew/bin/bun", MACOS)
            .with_common_path("${USERPROFILE}/.bun/bin/bun.exe", WINDOWS)
            .with_list_command(&["pm", "ls", "-g"])
            .with_uninstall_command(&["remove", "-g", "{package}"])
            .with_parser(parsers::parse_bun),
        // Python tooling
        // pip3 is the name every platform installs; a bare `pip` may be Python 2
        ManagerHandler::new(ManagerId::Pip, "pip")
            .with_executable("pip3")
            .with_common_path("/opt/homebrew/bin/pip3", MACOS)
            .with_common_path("/usr/local/bin/pip3", UNIX)
            .with_common_path("/usr/bin/pip3", UNIX)
            .with_common_path("~/.local/bin/pip3", LINUX)
            .with_common_path(
                "${LOCALAPPDATA}/Programs/Python/Python312/Scripts/pip3.exe",
                WINDOWS,
            )
            .with_list_command(&["list", "--format=json"])
            // stdin is closed, so the confirmation prompt must be skipped
            .with_uninstall_command(&["uninstall", "-y", "{package}"])
            .with_parser(parsers::parse_json_array),
        ManagerHandler::new(ManagerId::Pipx, "pipx")
            .with_common_path("~/.local/bin/pipx", UNIX)
            .with_common_path("/opt/homebrew/bin/pipx", MACOS)
            .with_common_path("/usr/bin/pipx", LINUX)
            .with_common_path("${USERPROFILE}/.local/bin/pipx.exe", WINDOWS)
            .with_list_command(&["list", "--short"])
            .with_uninstall_command(&["uninstall", "{package}"])
            .with_parser(parsers::parse_name_version_lines),
        ManagerHandler::new(ManagerId::Uv, "uv")
            .with_common_path("~/.local/bin/uv", UNIX)
            .with_common_path("~/.cargo/bin/uv", UNIX)
            .with_common_path("/opt/homebrew/bin/uv", MACOS)
            .with_common_path("${USERPROFILE}/.local/bin/uv.exe", WINDOWS)
            .with_common_path("${USERPROFILE}/.cargo/bin/uv.exe", WINDOWS)
            .with_list_command(&["tool", "list"])
            .with_uninstall_command(&["tool", "uninstall", "{package}"])
            .with_parser(parsers::parse_name_version_lines),
        ManagerHandler::new(ManagerId::Poetry, "Poetry")
            .with_common_path("~/.local/bin/poetry", UNIX)
            .with_common_path(
                "~/Library/Application Support/pypoetry/venv/bin/poetry",
                MACOS,
            )
            .with_common_path("${APPDATA}/Python/Scripts/poetry.exe", WINDOWS)
            .with_list_command(&["self", "show"])
            .with_uninstall_command(&["self", "remove", "{package}"])
            .with_parser(parsers::parse_name_version_lines),
        ManagerHandler::new(ManagerId::Conda, "Conda")
            .with_common_path("~/miniconda3/bin/conda", UNIX)
            .with_common_path("~/anaconda3/bin/conda", UNIX)
            .with_common_path("~/miniforge3/bin/conda", UNIX)
            .with_common_path("/opt/homebrew/Caskroom/miniforge/base/bin/conda", MACOS)
            .with_common_path("/opt/conda/bin/conda", LINUX)
            .with_common_path("${USERPROFILE}/miniconda3/Scripts/conda.exe", WINDOWS)
            .with_common_path("${USERPROFILE}/anaconda3/Scripts/conda.exe", WINDOWS)
            .with_list_command(&["list", "--json"])
            .with_uninstall_command(&["remove", "-y", "{package}"])
            .with_parser(parsers::parse_json_array),
        // Language version manager
        ManagerHandler::new(ManagerId::Pyenv, "pyenv")
            .with_common_path("${PYENV_ROOT}/bin/pyenv", UNIX)
            .with_common_path("~/.pyenv/bin/pyenv", UNIX)
            .with_common_path("/opt/homebrew/bin/pyenv", MACOS)
            .with_common_path("/usr/local/bin/pyenv", UNIX)
            .with_common_path("${USERPROFILE}/.pyenv/pyenv-win/bin/pyenv.bat", WINDOWS)
            .with_list_command(&["versions", "--bare"])
            .with_uninstall_command(&["uninstall", "-f", "{package}"])
            .with_parser(parsers::parse_pyenv),
        // Rust and Ruby
        ManagerHandler::new(ManagerId::Cargo, "Cargo")
            .with_common_path("${CARGO_HOME}/bin/cargo", UNIX)
            .with_common_path("~/.cargo/bin/cargo", UNIX)
            .with_common_path("${USERPROFILE}/.cargo/bin/cargo.exe", WINDOWS)
            .with_list_command(&["install", "--list"])
            .with_uninstall_command(&["uninstall", "{package}"])
            .with_parser(parsers::parse_cargo),
        ManagerHandler::new(ManagerId::Gem, "RubyGems")
            .with_common_path("/opt/homebrew/opt/ruby/bin/gem", MACOS)
            .with_common_path("/usr/local/opt/ruby/bin/gem", MACOS)
            .with_common_path("~/.rbenv/shims/gem", UNIX)
            .with_common_path("/usr/bin/gem", UNIX)
            .with_list_command(&["list", "--local"])
            .with_uninstall_command(&["uninstall", "-x", "{package}"])
            .with_force_args(&["--all", "--ignore-dependencies"])
            .with_parser(parsers::parse_gem),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_manager() {
        let registry = ManagerRegistry::builtin();
        assert_eq!(registry.len(), ManagerId::ALL.len());
        assert_eq!(registry.managers(), ManagerId::ALL.to_vec());
        for id in ManagerId::ALL {
            let handler = registry.get(id).unwrap();
            assert_eq!(handler.id, id);
            assert!(!handler.executable.is_empty());
            assert!(!handler.version_args.is_empty());
            assert!(handler.uninstall_command.takes_package());
            assert!(!handler.list_command.takes_package());
        }
    }

    #[test]
    fn test_builtin_handlers_pass_validation() {
        let validated = ManagerRegistry::from_handlers(builtin_handlers()).unwrap();
        assert_eq!(validated.len(), ManagerRegistry::builtin().len());
        assert_eq!(builtin_handlers().len(), ManagerId::ALL.len());
    }

    #[test]
    fn test_listed_pyenv_version_feeds_uninstall() {
        let registry = ManagerRegistry::builtin();
        let pyenv = registry.get(ManagerId::Pyenv).unwrap();

        let packages = pyenv.parse_list_output("3.12.1\n");
        assert_eq!(packages[0].name, "3.12.1");

        let spec = pyenv
            .uninstall_command_for(std::ffi::OsStr::new("pyenv"), &packages[0].name, false)
            .unwrap();
        assert_eq!(spec.args, vec!["uninstall", "-f", "3.12.1"]);
    }

    #[test]
    fn test_missing_handler_is_rejected() {
        let handlers: Vec<_> = builtin_handlers()
            .into_iter()
            .filter(|h| h.id != ManagerId::Conda)
            .collect();
        let err = ManagerRegistry::from_handlers(handlers).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingHandler {
                manager: ManagerId::Conda
            }
        );
    }

    #[test]
    fn test_duplicate_handler_is_rejected() {
        let mut handlers = builtin_handlers();
        handlers.push(ManagerHandler::new(ManagerId::Uv, "uv again"));
        let err = ManagerRegistry::from_handlers(handlers).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateHandler {
                manager: ManagerId::Uv
            }
        ));
    }

    #[test]
    fn test_every_unix_manager_has_a_common_path() {
        let registry = ManagerRegistry::builtin();
        for id in registry.managers() {
            let handler = registry.get(id).unwrap();
            assert!(
                handler
                    .common_paths
                    .iter()
                    .any(|p| p.applies_to(Platform::MacOS) || p.applies_to(Platform::Linux)),
                "{id} has no unix common path"
            );
        }
    }
}
