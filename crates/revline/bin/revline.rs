//! revline binary entry point.
//!
//! A thin wrapper around the revline library that:
//! 1. Parses command-line arguments (and their environment fallbacks)
//! 2. Initializes logging on stderr
//! 3. Prints each file with its lines in reverse order
//!
//! For library usage, see the revline crate documentation.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use revline::{DEFAULT_WINDOW_SIZE, ReaderConfig, ReverseLines};
use tracing_subscriber::EnvFilter;

/// Command-line configuration.
#[derive(Debug, Parser)]
#[command(
    name = "revline",
    about = "Print files with their lines in reverse order",
    version
)]
struct Cli {
    /// Bytes read per step; longer lines are printed in pieces
    #[arg(
        short,
        long,
        env = "REVLINE_WINDOW_SIZE",
        default_value_t = DEFAULT_WINDOW_SIZE
    )]
    window_size: usize,

    /// Treat the two characters `\n` as a line break
    #[arg(long, env = "REVLINE_UNESCAPE_NEWLINES")]
    unescape_newlines: bool,

    /// Files to print, in the order given
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    fn reader_config(&self) -> ReaderConfig {
        ReaderConfig::default()
            .with_window_size(self.window_size)
            .with_unescape_newlines(self.unescape_newlines)
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.reader_config();
    config.validate().context("Invalid configuration")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut failed = false;

    for path in &cli.files {
        let reader = match ReverseLines::open_with_config(path, config.clone()) {
            Ok(reader) => reader,
            Err(e) => {
                eprintln!("revline: {}: {e}", path.display());
                failed = true;
                continue;
            }
        };

        tracing::debug!("Printing {} in reverse", path.display());

        for unit in reader {
            let unit = unit.with_context(|| format!("Failed to read {}", path.display()))?;
            if let Err(e) = out.write_all(unit.as_bytes()) {
                return closed_output(e);
            }
        }
    }

    if let Err(e) = out.flush() {
        return closed_output(e);
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// A reader on the other end of a pipe going away is a normal way to stop.
fn closed_output(e: io::Error) -> Result<ExitCode> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(e).context("Failed to write output")
    }
}
