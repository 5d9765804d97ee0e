//! Unified output interface for table and JSON modes
//!
//! In CLI mode user-facing output goes to stdout. In JSON mode stdout is
//! reserved for the machine-readable report and everything else goes to
//! stderr.

mod config;
mod display;
pub(crate) mod writer;

pub use config::{OutputConfig, OutputMode};
pub use writer::write_json;

use once_cell::sync::OnceCell;

static OUTPUT_CONFIG: OnceCell<OutputConfig> = OnceCell::new();

/// Initialize the output system with the specified mode and verbosity
///
/// Only the first call takes effect.
pub fn init_with_verbosity(mode: OutputMode, verbose: bool) {
    let mut config = OutputConfig::new(mode);
    if verbose {
        config.set_verbose();
    }

    if OUTPUT_CONFIG.get().is_some() {
        return;
    }

    config.init_tracing();
    console::set_colors_enabled(config.colors_enabled());
    let _ = OUTPUT_CONFIG.set(config);
}

/// Get current output mode
pub fn current_mode() -> OutputMode {
    OUTPUT_CONFIG
        .get()
        .map(OutputConfig::mode)
        .unwrap_or(OutputMode::Cli)
}
