//! Tracing setup and user-facing diagnostics

use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` wins; otherwise `warn`, or
/// `debug` with `--verbose`.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("logging initialised");
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{} {}", "ERROR:".red(), message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    eprintln!("{} {}", "WARNING:".yellow(), message.as_ref());
}

pub fn fatal(message: impl AsRef<str>) {
    eprintln!("{} {}", "FATAL:".red().bold(), message.as_ref());
}
