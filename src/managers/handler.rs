use std::ffi::OsStr;
use std::path::PathBuf;

use super::{ManagerId, PackageInfo};
use crate::discovery::error::DiscoveryError;
use crate::probe::CommandSpec;
use crate::utils::fs::expand_path_template;
use crate::utils::Platform;

/// Turns a manager's list output into packages; must not panic on bad input
pub type PackageParser = fn(&str, ManagerId) -> Vec<PackageInfo>;

const PACKAGE_PLACEHOLDER: &str = "{package}";

/// Punctuation allowed in package names besides ASCII letters and digits.
/// Windows shims run through `cmd /C`, so shell metacharacters stay out.
const PACKAGE_NAME_PUNCTUATION: &[char] = &['@', '/', '.', '_', '+', '~', '=', ':', '-'];

/// One argument of a command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateArg {
    Literal(String),
    Package,
}

/// Argument vector with at most one package slot
///
/// The program is supplied at render time, because it depends on which tier
/// found the manager (bare name or absolute path).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTemplate {
    args: Vec<TemplateArg>,
}

impl CommandTemplate {
    /// Build from literal arguments; an argument equal to `{package}` becomes the slot
    pub fn parse(args: &[&str]) -> Self {
        Self {
            args: args
                .iter()
                .map(|arg| {
                    if *arg == PACKAGE_PLACEHOLDER {
                        TemplateArg::Package
                    } else {
                        TemplateArg::Literal(arg.to_string())
                    }
                })
                .collect(),
        }
    }

    pub fn args(&self) -> &[TemplateArg] {
        &self.args
    }

    pub fn takes_package(&self) -> bool {
        self.args.contains(&TemplateArg::Package)
    }

    /// Render into a runnable command
    ///
    /// The package name is validated before it is placed into its slot.
    pub fn render(
        &self,
        program: &OsStr,
        package: Option<&str>,
    ) -> Result<CommandSpec, DiscoveryError> {
        let mut rendered = Vec::with_capacity(self.args.len());

        for arg in &self.args {
            match arg {
                TemplateArg::Literal(value) => rendered.push(value.clone()),
                TemplateArg::Package => {
                    let name = package.ok_or_else(|| DiscoveryError::InvalidPackageName {
                        name: String::new(),
                        reason: "command requires a package name".to_string(),
                    })?;
                    validate_package_name(name)?;
                    rendered.push(name.to_string());
                }
            }
        }

        Ok(CommandSpec::new(program).with_args(rendered))
    }
}

/// Reject names that could be read as flags or that carry characters outside
/// `[A-Za-z0-9@/._+~=:-]`
pub fn validate_package_name(name: &str) -> Result<(), DiscoveryError> {
    let invalid = |reason: &str| DiscoveryError::InvalidPackageName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('-') {
        return Err(invalid("name must not start with '-'"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !PACKAGE_NAME_PUNCTUATION.contains(c))
    {
        return Err(invalid(&format!("name contains disallowed character {c:?}")));
    }

    Ok(())
}

/// A well-known install location, only probed on the listed platforms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonPath {
    pub template: String,
    pub platforms: Vec<Platform>,
}

impl CommonPath {
    pub fn new(template: &str, platforms: &[Platform]) -> Self {
        Self {
            template: template.to_string(),
            platforms: platforms.to_vec(),
        }
    }

    pub fn applies_to(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// Expand `~` and `${VAR}`; `None` when a variable is unset
    pub fn resolve(&self) -> Option<PathBuf> {
        expand_path_template(&self.template)
    }
}

/// Static description of how to find and drive one package manager
#[derive(Debug, Clone)]
pub struct ManagerHandler {
    pub id: ManagerId,
    pub display_name: String,
    /// Bare executable name used by the direct-command and PATH-scan tiers
    pub executable: String,
    pub version_args: Vec<String>,
    pub common_paths: Vec<CommonPath>,
    pub list_command: CommandTemplate,
    pub uninstall_command: CommandTemplate,
    /// Appended to the uninstall command when the caller forces removal
    pub force_args: Vec<String>,
    pub parser: PackageParser,
}

fn no_packages(_stdout: &str, _manager: ManagerId) -> Vec<PackageInfo> {
    Vec::new()
}

impl ManagerHandler {
    /// Create a handler whose executable matches the manager's canonical name
    pub fn new(id: ManagerId, display_name: &str) -> Self {
        Self {
            id,
            display_name: display_name.to_string(),
            executable: id.as_str().to_string(),
            version_args: vec!["--version".to_string()],
            common_paths: Vec::new(),
            list_command: CommandTemplate::default(),
            uninstall_command: CommandTemplate::default(),
            force_args: Vec::new(),
            parser: no_packages,
        }
    }

    pub fn with_executable(mut self, executable: &str) -> Self {
        self.executable = executable.to_string();
        self
    }

    pub fn with_version_args(mut self, args: &[&str]) -> Self {
        self.version_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a well-known location for the given platforms
    pub fn with_common_path(mut self, template: &str, platforms: &[Platform]) -> Self {
        self.common_paths.push(CommonPath::new(template, platforms));
        self
    }

    pub fn with_list_command(mut self, args: &[&str]) -> Self {
        self.list_command = CommandTemplate::parse(args);
        self
    }

    pub fn with_uninstall_command(mut self, args: &[&str]) -> Self {
        self.uninstall_command = CommandTemplate::parse(args);
        self
    }

    pub fn with_force_args(mut self, args: &[&str]) -> Self {
        self.force_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_parser(mut self, parser: PackageParser) -> Self {
        self.parser = parser;
        self
    }

    /// Version check against a bare name or an absolute path
    pub fn version_command(&self, program: impl AsRef<OsStr>) -> CommandSpec {
        CommandSpec::new(program.as_ref()).with_args(self.version_args.iter().cloned())
    }

    /// Expanded common paths that apply to `platform`, in declaration order
    pub fn common_paths_for(&self, platform: Platform) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for path in self
            .common_paths
            .iter()
            .filter(|p| p.applies_to(platform))
            .filter_map(CommonPath::resolve)
        {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    pub fn list_command_for(&self, program: &OsStr) -> Result<CommandSpec, DiscoveryError> {
        self.list_command.render(program, None)
    }

    pub fn uninstall_command_for(
        &self,
        program: &OsStr,
        package: &str,
        force: bool,
    ) -> Result<CommandSpec, DiscoveryError> {
        let mut spec = self.uninstall_command.render(program, Some(package))?;
        if force {
            spec.args.extend(self.force_args.iter().cloned());
        }
        Ok(spec)
    }

    pub fn parse_list_output(&self, stdout: &str) -> Vec<PackageInfo> {
        (self.parser)(stdout, self.id)
    }
}
