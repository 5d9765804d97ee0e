//! Best-effort parsers for each manager's list output.
//!
//! Every parser tolerates malformed input: unrecognised lines are skipped and
//! invalid JSON yields an empty list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{ManagerId, PackageInfo};

static CARGO_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+) v(\S+?)(?: \((.+)\))?:$").expect("valid regex"));
static GEM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+) \((.+)\)$").expect("valid regex"));
static YARN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^info "(.+)@([^@"]+)" has binaries"#).expect("valid regex"));
static BUN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:├──|└──)\s+(.+)@([^@\s]+)\s*$").expect("valid regex"));

fn looks_like_version(token: &str) -> bool {
    let token = token.strip_prefix('v').unwrap_or(token);
    token.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// `brew list --versions`: `name v1 v2 ...`, newest listed last
pub fn parse_brew(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let version = parts.last()?;
            Some(PackageInfo::new(name, version, manager))
        })
        .collect()
}

/// `npm ls -g --depth=0 --json`: `{"dependencies": {"name": {"version": ...}}}`
pub fn parse_npm_json(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    match serde_json::from_str::<Value>(stdout) {
        Ok(value) => dependencies_of(&value, manager),
        Err(_) => Vec::new(),
    }
}

/// `pnpm ls -g --depth=0 --json`: an array of projects, each with `dependencies`
pub fn parse_pnpm_json(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    match serde_json::from_str::<Value>(stdout) {
        Ok(Value::Array(projects)) => projects
            .iter()
            .flat_map(|project| dependencies_of(project, manager))
            .collect(),
        Ok(value) => dependencies_of(&value, manager),
        Err(_) => Vec::new(),
    }
}

fn dependencies_of(value: &Value, manager: ManagerId) -> Vec<PackageInfo> {
    let Some(deps) = value.get("dependencies").and_then(Value::as_object) else {
        return Vec::new();
    };

    deps.iter()
        .map(|(name, dep)| {
            let version = dep
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let package = PackageInfo::new(name.as_str(), version, manager);
            match dep.get("path").and_then(Value::as_str) {
                Some(path) => package.with_location(path),
                None => package,
            }
        })
        .collect()
}

/// `yarn global list`: `info "name@version" has binaries:`
pub fn parse_yarn(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .filter_map(|line| YARN_LINE.captures(line.trim()))
        .map(|caps| PackageInfo::new(&caps[1], &caps[2], manager))
        .collect()
}

/// `bun pm ls -g`: tree lines `├── name@version`
pub fn parse_bun(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .filter_map(|line| BUN_LINE.captures(line))
        .map(|caps| PackageInfo::new(caps[1].trim(), &caps[2], manager))
        .collect()
}

/// `pip list --format=json` and `conda list --json`: arrays of `{name, version}`
pub fn parse_json_array(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(stdout) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let version = entry
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let package = PackageInfo::new(name, version, manager);
            Some(match entry.get("channel").and_then(Value::as_str) {
                Some(channel) => package.with_location(channel),
                None => package,
            })
        })
        .collect()
}

/// Whitespace separated `name version ...` lines (pipx, uv, poetry)
///
/// Lines whose second token does not look like a version are skipped, which
/// drops uv's `- binary` lines and headers.
pub fn parse_name_version_lines(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let version = parts.next()?;
            if name.starts_with('-') || !looks_like_version(version) {
                return None;
            }
            Some(PackageInfo::new(
                name,
                version.strip_prefix('v').unwrap_or(version),
                manager,
            ))
        })
        .collect()
}

/// `pyenv versions --bare`: one installed interpreter per line
///
/// The interpreter id doubles as the name, since `pyenv uninstall` takes it.
pub fn parse_pyenv(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|version| PackageInfo::new(version, version, manager))
        .collect()
}

/// `cargo install --list`: `name vX.Y.Z:` headers followed by indented binaries
pub fn parse_cargo(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| CARGO_HEADER.captures(line.trim_end()))
        .map(|caps| {
            let package = PackageInfo::new(&caps[1], &caps[2], manager);
            match caps.get(3) {
                Some(source) => package.with_location(source.as_str()),
                None => package,
            }
        })
        .collect()
}

/// `gem list --local`: `name (1.2.0, default: 1.1.0)`
pub fn parse_gem(stdout: &str, manager: ManagerId) -> Vec<PackageInfo> {
    stdout
        .lines()
        .filter_map(|line| GEM_LINE.captures(line.trim()))
        .filter_map(|caps| {
            let first = caps[2].split(',').next()?.trim();
            let version = first.strip_prefix("default:").unwrap_or(first).trim();
            if version.is_empty() {
                return None;
            }
            Some(PackageInfo::new(&caps[1], version, manager))
        })
        .collect()
}
