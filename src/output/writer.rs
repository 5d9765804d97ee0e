//! Low-level writing logic for output routing

use super::config::OutputMode;
use serde::Serialize;
use std::io::{self, Write};

/// Write display output: stdout in CLI mode, stderr in JSON mode
pub fn write_output(mode: OutputMode, args: std::fmt::Arguments) -> io::Result<()> {
    match mode {
        OutputMode::Cli => {
            print!("{args}");
            io::stdout().flush()
        }
        // stdout belongs to the JSON report
        OutputMode::Json => {
            eprint!("{args}");
            io::stderr().flush()
        }
    }
}

/// [`write_output`] with a trailing newline
pub fn writeln_output(mode: OutputMode, args: std::fmt::Arguments) -> io::Result<()> {
    match mode {
        OutputMode::Cli => {
            println!("{args}");
            io::stdout().flush()
        }
        OutputMode::Json => {
            eprintln!("{args}");
            io::stderr().flush()
        }
    }
}

/// Pretty-print `value` as JSON on stdout
pub fn write_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    writeln!(handle)?;
    handle.flush()
}
