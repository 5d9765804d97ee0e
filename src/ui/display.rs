use console::{pad_str, style, Alignment};

use crate::discovery::{Availability, CustomPaths, DiscoveryOrchestrator, ManagerStatus};
use crate::managers::PackageInfo;
use crate::display_println;

pub fn print_header(title: &str) {
    display_println!("{}", style(title).blue().bold());
    print_separator();
}

pub fn print_success(message: &str) {
    display_println!("{} {}", style("✅").green(), message);
}

pub fn print_warning(message: &str) {
    display_println!("{} {}", style("⚠️").yellow(), message);
}

pub fn print_info(message: &str) {
    display_println!("{} {}", style("ℹ️").blue(), message);
}

pub fn format_availability(status: Availability) -> String {
    match status {
        Availability::Available => style("✓ available").green().to_string(),
        Availability::PathMissing => style("● path missing").yellow().to_string(),
        Availability::NotInstalled => style("✗ not installed").dim().to_string(),
    }
}

pub fn format_path(path: &str) -> String {
    style(path).dim().to_string()
}

fn cell(text: &str, width: usize) -> String {
    pad_str(text, width, Alignment::Left, None).into_owned()
}

pub fn print_table_header(columns: &[(&str, usize)]) {
    let header = columns
        .iter()
        .map(|(col, width)| style(cell(col, *width)).bold().underlined().to_string())
        .collect::<Vec<_>>()
        .join("  ");

    display_println!("{header}");
}

pub fn print_separator() {
    display_println!("{}", "─".repeat(50));
}

/// One row per manager, followed by the PATH hints of off-PATH managers
pub fn print_status_table(discovery: &DiscoveryOrchestrator, statuses: &[ManagerStatus]) {
    print_table_header(&[("MANAGER", 14), ("STATUS", 16), ("FOUND VIA", 14), ("PATH", 0)]);

    for status in statuses {
        let name = discovery
            .get_handler(status.manager())
            .map(|h| h.display_name.clone())
            .unwrap_or_else(|| status.manager().to_string());
        let method = status
            .discovery_method()
            .map(|m| m.to_string())
            .unwrap_or_default();
        let path = status
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        display_println!(
            "{}  {}  {}  {}",
            style(cell(&name, 14)).cyan().bold(),
            cell(&format_availability(status.status()), 16),
            cell(&method, 14),
            format_path(&path)
        );
    }

    let hints: Vec<&str> = statuses.iter().filter_map(ManagerStatus::message).collect();
    if !hints.is_empty() {
        display_println!();
        for hint in hints {
            print_warning(hint);
        }
    }
}

pub fn print_status_detail(discovery: &DiscoveryOrchestrator, status: &ManagerStatus) {
    let manager = status.manager();
    let name = discovery
        .get_handler(manager)
        .map(|h| h.display_name.as_str())
        .unwrap_or_else(|| manager.as_str());

    print_header(name);
    display_println!("  Status:     {}", format_availability(status.status()));
    display_println!("  In PATH:    {}", if status.in_path() { "yes" } else { "no" });
    if let Some(method) = status.discovery_method() {
        display_println!("  Found via:  {}", method);
    }
    if let Some(path) = status.path() {
        display_println!("  Executable: {}", format_path(&path.display().to_string()));
    }
    if let Some(message) = status.message() {
        display_println!();
        print_warning(message);
    }
}

pub fn print_packages(packages: &[PackageInfo]) {
    if packages.is_empty() {
        print_info("No packages found");
        return;
    }

    let name_width = packages
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0)
        .clamp(8, 40);

    print_table_header(&[("MANAGER", 8), ("PACKAGE", name_width), ("VERSION", 12), ("LOCATION", 0)]);
    for package in packages {
        display_println!(
            "{}  {}  {}  {}",
            style(cell(package.manager.as_str(), 8)).cyan(),
            style(cell(&package.name, name_width)).bold(),
            cell(&package.version, 12),
            format_path(package.location.as_deref().unwrap_or(""))
        );
    }
    display_println!();
    display_println!("{} packages", packages.len());
}

pub fn print_custom_paths(config_path: &str, paths: &CustomPaths) {
    display_println!("Config file: {}", format_path(config_path));
    if paths.is_empty() {
        print_info("No custom paths configured");
        return;
    }

    let mut managers: Vec<_> = paths.keys().copied().collect();
    managers.sort();
    for manager in managers {
        display_println!("{}", style(manager).cyan().bold());
        for path in &paths[&manager] {
            display_println!("  {}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_functions() {
        assert!(format_availability(Availability::Available).contains("available"));
        assert!(format_availability(Availability::PathMissing).contains("path missing"));
        assert!(format_availability(Availability::NotInstalled).contains("not installed"));
        assert!(format_path("/opt/homebrew/bin").contains("/opt/homebrew/bin"));
    }

    #[test]
    fn test_cells_pad_to_width() {
        assert_eq!(cell("npm", 6), "npm   ");
        assert_eq!(cell("toolong", 3), "toolong");
    }
}
