//! File-based logging.
//!
//! The TUI owns the terminal, so log output goes to
//! ${MNEMO_HOME}/logs/mnemo.log instead of stderr. Filtering follows
//! RUST_LOG (default `info`). Initialization failure is non-fatal: the
//! client runs unlogged rather than refusing to start.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config;

/// Initializes file logging under the mnemo home directory.
///
/// The returned guard flushes buffered log lines when dropped; keep it alive
/// for the life of the process.
pub fn init() -> Option<WorkerGuard> {
    init_at(&config::paths::logs_dir())
}

fn init_at(dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, "mnemo.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_init_creates_log_directory() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");

        // May return None if another test already installed a subscriber;
        // the directory side effect is what matters here.
        let _guard = init_at(&logs);
        assert!(logs.exists());
    }
}
