// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coalescing snapshot writer.
//!
//! After any observable state change, callers enqueue a write. If a write
//! is already pending, the request is coalesced into it (`dirty` flag); if
//! one is currently in flight, another run is scheduled right after it
//! completes. A write failure is logged and retried with exponential
//! backoff; the in-memory state remains authoritative regardless.

use crate::snapshot::{self, Snapshot, SnapshotError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// A snapshot source the writer pulls the latest state from at write time
/// (rather than the caller marshalling a `Snapshot` up front) — ensures the
/// writer always persists the freshest state even if several `request`
/// calls coalesce into one write.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn snapshot(&self) -> Snapshot;
}

/// Handle for requesting a snapshot write. Cheap to clone; cloning does not
/// spawn another writer task.
#[derive(Clone)]
pub struct SnapshotWriter {
    notify: Arc<Notify>,
    dirty: Arc<AtomicBool>,
}

impl SnapshotWriter {
    /// Spawn the background writer task and return a handle for requesting
    /// writes. The task runs until `shutdown` is awaited or the handle (and
    /// all clones) are dropped.
    pub fn spawn(path: PathBuf, source: Arc<dyn SnapshotSource>) -> (Self, mpsc::Sender<()>) {
        let notify = Arc::new(Notify::new());
        let dirty = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task_notify = notify.clone();
        let task_dirty = dirty.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_notify.notified() => {}
                    _ = shutdown_rx.recv() => break,
                }

                // Coalesce: keep writing while requests keep arriving.
                while task_dirty.swap(false, Ordering::AcqRel) {
                    let snapshot = source.snapshot().await;
                    write_with_retry(&path, &snapshot).await;
                }
            }
        });

        (Self { notify, dirty }, shutdown_tx)
    }

    /// Request a write. Safe to call from any number of concurrent
    /// callers; bursts collapse into the minimum number of actual writes
    /// needed to persist the latest state.
    pub fn request(&self) {
        self.dirty.store(true, Ordering::Release);
        self.notify.notify_one();
    }
}

async fn write_with_retry(path: &std::path::Path, snapshot: &Snapshot) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match snapshot::write_atomic(path, snapshot).await {
            Ok(()) => return,
            Err(e) => {
                log_write_failure(&e);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

fn log_write_failure(e: &SnapshotError) {
    tracing::error!(error = %e, "snapshot write failed, retrying with backoff");
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
