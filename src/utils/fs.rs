use std::path::{Path, PathBuf};

use super::platform::Platform;

/// Expand tilde in path
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();

    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }

    path.to_path_buf()
}

/// Expand a path template containing `~/` and `${VAR}` references
///
/// Returns `None` when a referenced variable is unset or empty, so callers can
/// skip templates that make no sense on this machine.
pub fn expand_path_template(template: &str) -> Option<PathBuf> {
    expand_path_template_with(template, |name| std::env::var(name).ok())
}

/// Same as [`expand_path_template`] with an injectable variable lookup
pub fn expand_path_template_with<F>(template: &str, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}')?;
        let value = lookup(&after[..end]).filter(|v| !v.is_empty())?;
        expanded.push_str(&value);
        rest = &after[end + 1..];
    }
    expanded.push_str(rest);

    if expanded.trim().is_empty() {
        return None;
    }

    Some(expand_tilde(expanded))
}

/// Check whether a file has executable permission bits set
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows executability comes from the file extension, which the caller
/// already matched against `PATHEXT`
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Parse the `PATH` environment variable into a list of directories
pub fn search_path_from_env() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Find an executable by bare name in the given directories
///
/// Returns the first match in directory order. Does not spawn `which`/`where`.
pub fn find_executable_in(
    name: &str,
    directories: &[PathBuf],
    platform: Platform,
) -> Option<PathBuf> {
    let suffixes = platform.executable_suffixes();

    for dir in directories {
        if dir.as_os_str().is_empty() {
            continue;
        }
        for suffix in &suffixes {
            let candidate = dir.join(format!("{name}{suffix}"));
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::probe::mock::write_executable;
    #[cfg(unix)]
    use tempfile::TempDir;

    #[test]
    fn test_expand_tilde() {
        if dirs::home_dir().is_some() {
            let expanded = expand_tilde("~/test");
            assert!(expanded.to_string_lossy().contains("test"));
            assert!(!expanded.to_string_lossy().starts_with("~"));
        }

        let unchanged = expand_tilde("/absolute/path");
        assert_eq!(unchanged, Path::new("/absolute/path"));
    }

    #[test]
    fn test_expand_template_variables() {
        let lookup = |name: &str| match name {
            "LOCALAPPDATA" => Some("/appdata".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        };

        assert_eq!(
            expand_path_template_with("${LOCALAPPDATA}/pnpm/pnpm", lookup),
            Some(PathBuf::from("/appdata/pnpm/pnpm"))
        );
        assert_eq!(expand_path_template_with("${MISSING}/bin/uv", lookup), None);
        assert_eq!(expand_path_template_with("${EMPTY}/bin/uv", lookup), None);
        assert_eq!(expand_path_template_with("${UNCLOSED/bin", lookup), None);
        assert_eq!(
            expand_path_template_with("/opt/homebrew/bin/brew", lookup),
            Some(PathBuf::from("/opt/homebrew/bin/brew"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_find_executable_in_respects_order_and_mode() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        // Not executable, so skipped
        std::fs::write(first.path().join("uv"), "data").unwrap();
        write_executable(&second.path().join("uv"));

        let dirs = vec![
            PathBuf::new(),
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ];
        let found = find_executable_in("uv", &dirs, Platform::Linux);
        assert_eq!(found, Some(second.path().join("uv")));

        assert_eq!(find_executable_in("pipx", &dirs, Platform::Linux), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_directories_are_not_executables() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("cargo")).unwrap();
        assert!(!is_executable(&dir.path().join("cargo")));
    }
}
