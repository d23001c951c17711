// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup: `tracing-subscriber` with an
//! env-filter to stderr, plus a daily-rotating log file under
//! `$CYRUS_HOME/logs/` via `tracing-appender`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. The returned guard must be held
/// for the rest of the process's life — dropping it stops the background
/// flush thread, silently truncating buffered log lines.
pub fn init(cyrus_home: &Path) -> WorkerGuard {
    let log_dir = cyrus_home.join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("warning: could not create log directory {}: {e}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(&log_dir, "cyrus.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("CYRUS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(non_blocking))
        .try_init();

    guard
}
