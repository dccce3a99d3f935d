//! Diagnostics for the bell.
//!
//! The terminal belongs to the UI while the bell runs, so tracing output is
//! written to a log file instead of stderr. The level comes from `RUST_LOG`
//! and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=meditation_bell=debug bell --log-file /tmp/bell.log
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber, appending to `path`.
///
/// Lines are handed to a background writer thread, so logging never blocks
/// the UI loop. The returned guard flushes that thread when dropped and must
/// be held for as long as the program logs.
///
/// Parent directories are created as needed. Fails if the file cannot be
/// opened or a subscriber is already installed.
pub fn init(path: &Path) -> io::Result<WorkerGuard> {
    let file = open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(io::Error::other)?;
    Ok(guard)
}

fn open(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bell.log");
        open(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_open_appends() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bell.log");
        writeln!(open(&path).unwrap(), "first").unwrap();
        writeln!(open(&path).unwrap(), "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_init_writes_through_background_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bell.log");

        let guard = init(&path).unwrap();
        tracing::warn!("bell log smoke line");
        drop(guard);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("bell log smoke line"), "log was {text:?}");

        // Only one global subscriber per process.
        assert!(init(&dir.path().join("other.log")).is_err());
    }
}
