use anyhow::{Context, Result};
use env_logger::Target;
use log::LevelFilter;
use std::fs;
use std::io;
use std::path::Path;

/// Install the process-wide logger.
///
/// Logs go to `log_file` when one is given and can be opened for appending, otherwise to
/// stderr (stdout carries the resolved device path). `RUST_LOG` overrides `level`.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let target = log_file
        .and_then(|path| open_log_file(path).ok())
        .unwrap_or(Target::Stderr);

    env_logger::Builder::new()
        .target(target)
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .context("logger already initialised")
}

fn open_log_file(path: &Path) -> io::Result<Target> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(Target::Pipe(Box::new(file)))
}
