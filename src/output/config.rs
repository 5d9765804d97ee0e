//! Output configuration and mode management

use console::Term;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Output mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Normal CLI operation - display to stdout, logs to stderr
    Cli,
    /// JSON report mode - stdout carries only the report, display goes to stderr
    Json,
}

/// Configuration for the output system
#[derive(Debug)]
pub struct OutputConfig {
    mode: OutputMode,
    color_enabled: bool,
    log_level: Level,
}

impl OutputConfig {
    pub fn new(mode: OutputMode) -> Self {
        // Human output lands on stderr in JSON mode
        let color_enabled = match mode {
            OutputMode::Cli => Term::stdout().features().colors_supported(),
            OutputMode::Json => Term::stderr().features().colors_supported(),
        };

        let log_level = match std::env::var("RUST_LOG") {
            Ok(level) => match level.to_lowercase().as_str() {
                "trace" => Level::TRACE,
                "debug" => Level::DEBUG,
                "info" => Level::INFO,
                "error" => Level::ERROR,
                _ => Level::WARN,
            },
            Err(_) => Level::WARN,
        };

        Self {
            mode,
            color_enabled,
            log_level,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn colors_enabled(&self) -> bool {
        self.color_enabled
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// Set verbose mode (DEBUG level)
    pub fn set_verbose(&mut self) {
        if self.log_level < Level::DEBUG {
            self.log_level = Level::DEBUG;
        }
    }

    /// Initialize the tracing subscriber; logs always go to stderr
    pub fn init_tracing(&self) {
        // RUST_LOG directives such as `devscope=trace` win over the level
        let filter = EnvFilter::try_from_default_env()
            .ok()
            .filter(|_| self.log_level < Level::DEBUG)
            .unwrap_or_else(|| EnvFilter::new(self.log_level.to_string()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr);

        let result = match self.mode {
            OutputMode::Cli => builder.with_ansi(self.color_enabled).try_init(),
            OutputMode::Json => builder
                .with_ansi(false)
                .without_time()
                .compact()
                .try_init(),
        };

        // A subscriber may already be installed, e.g. by a test harness
        let _ = result;
    }
}
