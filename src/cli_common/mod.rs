//! Shared CLI plumbing for the `platform-compat` binary:
//! logging initialisation, console messages and report output.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod output;

pub use args::{ConfigArgs, OutputArgs};
pub use output::{OutputFormat, OutputWriter};

/// Initialises `tracing` output. `RUST_LOG` is honoured; `verbose` raises the
/// default level to DEBUG.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    Ok(())
}

/// Logging for `--quiet` runs: warnings and errors only.
pub fn init_minimal_logging() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    Ok(())
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✅".green(), message.green());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ️".blue(), message);
}

pub fn validate_path(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "{} does not exist: {}",
            description,
            path.display()
        ));
    }
    Ok(())
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        use std::time::Duration;

        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_validate_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_path(dir.path(), "Input").is_ok());
        let missing = dir.path().join("missing.json");
        let err = validate_path(&missing, "Input").unwrap_err();
        assert!(err.to_string().starts_with("Input does not exist"));
    }
}
