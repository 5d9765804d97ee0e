//! User-supplied install locations for the custom-path tier
//!
//! Read from the `custom_paths` section of the config file. Loading never
//! fails: a missing, empty or malformed file means no custom paths, and bad
//! entries are skipped with a warning.

use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::managers::ManagerId;
use crate::utils::fs::expand_path_template;

/// Raw path templates per manager, in file order
pub type CustomPaths = HashMap<ManagerId, Vec<String>>;

/// Load custom paths from `path`, degrading to an empty map on any failure
pub async fn load_custom_paths(path: &Path) -> CustomPaths {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config file at {}, no custom paths", path.display());
            return CustomPaths::new();
        }
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return CustomPaths::new();
        }
    };

    parse_custom_paths(&contents)
}

/// Extract the `custom_paths` section from YAML text
pub fn parse_custom_paths(contents: &str) -> CustomPaths {
    let mut paths = CustomPaths::new();

    if contents.trim().is_empty() {
        return paths;
    }

    let document: Value = match serde_yaml::from_str(contents) {
        Ok(document) => document,
        Err(e) => {
            warn!("Ignoring custom paths, config is not valid YAML: {}", e);
            return paths;
        }
    };

    let section = match document.get("custom_paths") {
        Some(Value::Mapping(section)) => section,
        Some(Value::Null) | None => return paths,
        Some(_) => {
            warn!("Ignoring custom_paths: expected a map of manager to path list");
            return paths;
        }
    };

    for (key, value) in section {
        let Some(name) = key.as_str() else {
            warn!("Ignoring custom_paths key that is not a string: {:?}", key);
            continue;
        };

        let manager = match name.parse::<ManagerId>() {
            Ok(manager) => manager,
            Err(e) => {
                warn!("Ignoring custom_paths entry: {}", e);
                continue;
            }
        };

        let entries = match value {
            Value::Sequence(items) => items.as_slice(),
            // A single path written without brackets
            Value::String(single) => {
                push_unique(paths.entry(manager).or_default(), single);
                continue;
            }
            Value::Null => continue,
            other => {
                warn!(
                    "Ignoring custom_paths.{}: expected a list of paths, got {:?}",
                    name, other
                );
                continue;
            }
        };

        for item in entries {
            match item.as_str() {
                Some(entry) if !entry.trim().is_empty() => {
                    push_unique(paths.entry(manager).or_default(), entry.trim())
                }
                _ => warn!("Ignoring non-string path under custom_paths.{}", name),
            }
        }
    }

    paths.retain(|_, list| !list.is_empty());
    paths
}

fn push_unique(list: &mut Vec<String>, entry: &str) {
    if !list.iter().any(|existing| existing == entry) {
        list.push(entry.to_string());
    }
}

/// Expanded custom paths for one manager; templates with unset variables are dropped
pub fn resolve_custom_paths(paths: &CustomPaths, manager: ManagerId) -> Vec<PathBuf> {
    let mut resolved = Vec::new();
    for template in paths.get(&manager).into_iter().flatten() {
        match expand_path_template(template) {
            Some(path) if !resolved.contains(&path) => resolved.push(path),
            Some(_) => {}
            None => debug!("Skipping custom path {} for {}", template, manager),
        }
    }
    resolved
}
