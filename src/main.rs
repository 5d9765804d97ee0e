use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::{Confirm, InquireError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use devscope::discovery::{default_config_path, CustomPaths, DiscoveryConfig};
use devscope::output::{self, write_json, OutputMode};
use devscope::ui::{display, ListingSpinner};
use devscope::utils::Platform;
use devscope::{
    DiscoveryOrchestrator, ManagerId, ManagerRegistry, ManagerStatus, PackageInfo, PathCache,
    SystemProbe, UninstallOptions,
};

#[derive(Parser)]
#[command(name = "devscope")]
#[command(
    about = "Find the package managers on this machine and the packages they installed",
    long_about = "devscope checks every supported package manager, reports whether it is\n\
                  installed and reachable from your shell, and lists or removes the\n\
                  packages it manages.\n\n\
                  A manager shown as 'path missing' was found on disk but its directory\n\
                  is not on PATH. Extra install locations can be added under\n\
                  'custom_paths' in ~/.devscope/config.yaml."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DEVSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Print a JSON report on stdout instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of every supported package manager
    Managers {
        /// Ignore cached results and probe again
        #[arg(long)]
        refresh: bool,
    },

    /// Show the status of one package manager
    Status {
        /// Manager name (brew, npm, pip, cargo, ...)
        manager: String,
    },

    /// List installed packages for one manager, or for all of them
    Packages {
        /// Manager name; omit to list every installed manager
        manager: Option<ManagerId>,
    },

    /// Remove a package through its manager
    Uninstall {
        /// Package name
        package: String,

        /// Manager that owns the package
        #[arg(short, long)]
        manager: ManagerId,

        /// Pass the manager's force flags
        #[arg(long)]
        force: bool,

        /// Show the command without running it
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show configured custom paths and the config file location
    Paths,
}

#[derive(Serialize)]
struct ManagersReport {
    generated_at: DateTime<Utc>,
    platform: Platform,
    managers: Vec<ManagerStatus>,
}

#[derive(Serialize)]
struct PackagesReport {
    generated_at: DateTime<Utc>,
    platform: Platform,
    packages: Vec<PackageInfo>,
}

#[derive(Serialize)]
struct PathsReport<'a> {
    config_path: &'a Path,
    custom_paths: &'a CustomPaths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Cli
    };
    output::init_with_verbosity(output_mode, cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = match DiscoveryConfig::load_from_file(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            warn!("{:#}", e);
            display::print_warning(&format!("{e:#}; using default settings"));
            DiscoveryConfig::default()
        }
    };

    let cache = Arc::new(PathCache::with_default_ttl(config.cache_ttl()));
    let discovery = DiscoveryOrchestrator::new(
        ManagerRegistry::builtin(),
        cache,
        Arc::new(SystemProbe::new()),
        config,
    );
    discovery.load_custom_config_from(&config_path).await;

    match cli.command {
        Commands::Managers { refresh } => {
            let statuses = if refresh {
                discovery.refresh_all().await
            } else {
                discovery.discover_available_managers().await
            };

            if cli.json {
                write_json(&ManagersReport {
                    generated_at: Utc::now(),
                    platform: Platform::current(),
                    managers: statuses,
                })?;
            } else {
                display::print_header(&format!(
                    "Package managers on {}",
                    Platform::current().display_name()
                ));
                display::print_status_table(&discovery, &statuses);
            }
        }

        Commands::Status { manager } => {
            let Some(status) = discovery.status_by_name(&manager).await else {
                let supported: Vec<&str> = discovery
                    .get_registered_managers()
                    .iter()
                    .map(|m| m.as_str())
                    .collect();
                bail!(
                    "'{}' is not a supported package manager (supported: {})",
                    manager,
                    supported.join(", ")
                );
            };

            if cli.json {
                write_json(&status)?;
            } else {
                display::print_status_detail(&discovery, &status);
            }
        }

        Commands::Packages { manager } => {
            let packages = match manager {
                Some(manager) => {
                    let status = discovery.get_manager_status(manager).await;
                    if !status.is_usable() && !cli.json {
                        display::print_warning(&format!("{manager} is not installed"));
                    }
                    discovery.list_packages(manager).await
                }
                None => {
                    let mut spinner =
                        ListingSpinner::new(!cli.json && console::Term::stderr().is_term());
                    let packages = discovery
                        .list_all_packages(|manager, progress| spinner.update(manager, &progress))
                        .await;
                    spinner.finish();
                    packages
                }
            };

            if cli.json {
                write_json(&PackagesReport {
                    generated_at: Utc::now(),
                    platform: Platform::current(),
                    packages,
                })?;
            } else {
                display::print_packages(&packages);
            }
        }

        Commands::Uninstall {
            package,
            manager,
            force,
            dry_run,
            yes,
        } => {
            if !yes && !dry_run && !confirm_uninstall(&package, manager)? {
                display::print_info("Cancelled");
                return Ok(());
            }

            let options = UninstallOptions { force, dry_run };
            if !discovery.uninstall_package(&package, manager, options).await {
                bail!("Failed to uninstall {} with {}", package, manager);
            }

            if dry_run {
                display::print_info(&format!(
                    "Dry run: {package} would be uninstalled with {manager}"
                ));
            } else {
                display::print_success(&format!("Uninstalled {package} with {manager}"));
            }
        }

        Commands::Paths => {
            let custom_paths = discovery.custom_paths();
            if cli.json {
                write_json(&PathsReport {
                    config_path: &config_path,
                    custom_paths: &custom_paths,
                })?;
            } else {
                display::print_custom_paths(&config_path.display().to_string(), &custom_paths);
            }
        }
    }

    Ok(())
}

fn confirm_uninstall(package: &str, manager: ManagerId) -> Result<bool> {
    let answer = Confirm::new(&format!("Uninstall {package} with {manager}?"))
        .with_default(false)
        .with_help_message("ESC to cancel")
        .prompt();

    match answer {
        Ok(confirmed) => Ok(confirmed),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
