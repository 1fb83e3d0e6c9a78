//! Crash dumps.
//!
//! A panic hook that writes a timestamped text report into a dump
//! directory before the previous hook (normally the default stderr
//! printer) runs. Nothing is recovered; the report is for post-mortem use.

use std::backtrace::Backtrace;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Name of the dump written for a crash at `when`, e.g. `2024-0305-0708.dmp`.
pub fn dump_file_name(when: NaiveDateTime) -> String {
    format!("{}.dmp", when.format("%Y-%m%d-%H%M"))
}

/// Install the crash hook. Dumps land in `dump_dir`, created on demand.
pub fn install_crash_hook(dump_dir: impl Into<PathBuf>) {
    let dump_dir = dump_dir.into();
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        let thread = std::thread::current();
        let report = format_report(
            &message,
            location.as_deref(),
            thread.name().unwrap_or("<unnamed>"),
            &Backtrace::force_capture().to_string(),
        );

        match write_dump(&dump_dir, &report) {
            Ok(path) => log::error!("crash dump written to {}", path.display()),
            Err(e) => log::error!("failed to write crash dump: {e}"),
        }
        previous(info);
    }));
}

pub fn format_report(message: &str, location: Option<&str>, thread: &str, backtrace: &str) -> String {
    format!(
        "panic: {message}\nlocation: {}\nthread: {thread}\n\nbacktrace:\n{backtrace}\n",
        location.unwrap_or("<unknown>")
    )
}

fn write_dump(dir: &Path, report: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(dump_file_name(chrono::Local::now().naive_local()));
    let mut file = std::fs::File::create(&path)?;
    file.write_all(report.as_bytes())?;
    Ok(path)
}
