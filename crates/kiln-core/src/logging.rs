//! Logger bootstrap.
//!
//! Installs `env_logger` behind the `log` facade. Each run gets its own log
//! file named after the local start time; every record is echoed to stderr
//! as well.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};

use chrono::NaiveDateTime;

use crate::config::LogSection;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "kiln_render=debug,wgpu_core=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Directory for the per-run log file. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            directory: None,
        }
    }
}

impl From<&LogSection> for LoggingConfig {
    fn from(section: &LogSection) -> Self {
        Self {
            env_filter: section.filter.clone(),
            write_style: if section.color {
                env_logger::WriteStyle::Auto
            } else {
                env_logger::WriteStyle::Never
            },
            directory: Some(section.directory.clone()),
        }
    }
}

static INIT: Once = Once::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Name of the log file for a run started at `started`.
pub fn log_file_name(started: NaiveDateTime) -> String {
    format!("{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Initializes the global logger once and returns the log file path, if any.
///
/// Subsequent calls are ignored and return the path chosen by the first one.
pub fn init_logging(config: LoggingConfig) -> Option<PathBuf> {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder
                .filter_level(log::LevelFilter::Info)
                .filter_module("wgpu_core", log::LevelFilter::Warn)
                .filter_module("wgpu_hal", log::LevelFilter::Warn)
                .filter_module("naga", log::LevelFilter::Warn);
        }

        builder.write_style(config.write_style);

        let mut open_error = None;
        if let Some(dir) = &config.directory {
            match open_log_file(dir) {
                Ok((path, file)) => {
                    builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
                    let _ = LOG_PATH.set(path);
                }
                Err(e) => open_error = Some(e),
            }
        }

        builder.init();

        if let Some(e) = open_error {
            log::warn!("log file unavailable, logging to stderr only: {e}");
        }
        if let Some(path) = LOG_PATH.get() {
            log::info!("logging to {}", path.display());
        }
    });
    LOG_PATH.get().cloned()
}

fn open_log_file(dir: &Path) -> io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(chrono::Local::now().naive_local()));
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Writes every record to the log file and to stderr.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        // stderr may be closed when launched detached; the file still gets the record
        let _ = io::stderr().write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        io::stderr().flush()
    }
}
