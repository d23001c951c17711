// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Persisted Snapshot: a JSON document written atomically on every
//! state change.
//!
//! A JSON document holding the repository-config path, every session
//! record, the parent/child map, and a schema-version integer. Written
//! atomically (temp file + rename) on every observable state change.

use cyrus_core::{AgentSession, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Current on-disk schema version. Bump whenever `Snapshot`'s shape
/// changes in a way that isn't backward-compatible with `#[serde(default)]`.
pub const SCHEMA_VERSION: u32 = 1;

/// Mapping `childSessionId -> parentSessionId`.
pub type ParentChildMap = BTreeMap<SessionId, SessionId>;

/// The full persisted state snapshot.
///
/// Sessions are keyed by `session_id` and sorted (`BTreeMap`) so that two
/// snapshots holding the same logical state serialize byte-identically —
/// the "serialise -> deserialise -> serialise is byte-identical under
/// a stable key ordering" round-trip property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub repository_config_path: PathBuf,
    pub sessions: BTreeMap<SessionId, AgentSession>,
    pub parent_child_map: ParentChildMap,
}

impl Snapshot {
    pub fn new(repository_config_path: PathBuf) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            repository_config_path,
            sessions: BTreeMap::new(),
            parent_child_map: ParentChildMap::new(),
        }
    }
}

/// Errors from reading or writing a snapshot.
///
/// `IntegrityError`: logged, the corrupt file is
/// quarantined, and a fresh snapshot is written rather than the process
/// refusing to start.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot at {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to write snapshot at {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },
    #[error("snapshot at {path} is corrupt: {source}")]
    Corrupt { path: PathBuf, #[source] source: serde_json::Error },
    #[error("failed to serialize snapshot for {path}: {source}")]
    Serialize { path: PathBuf, #[source] source: serde_json::Error },
}

/// Load a snapshot from `path`.
///
/// Returns `Ok(None)` if the file does not exist (first run). On a parse
/// failure, the caller is expected to call [`quarantine`] and start fresh —
/// this function itself never deletes anything.
pub async fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SnapshotError::Read { path: path.to_path_buf(), source: e }),
    };
    let snapshot: Snapshot = serde_json::from_slice(&bytes)
        .map_err(|e| SnapshotError::Corrupt { path: path.to_path_buf(), source: e })?;
    Ok(Some(snapshot))
}

/// Move a corrupt snapshot aside so a fresh one can be written in its
/// place.
pub async fn quarantine(path: &Path) -> Result<PathBuf, SnapshotError> {
    let quarantined = path.with_extension("json.corrupt");
    tokio::fs::rename(path, &quarantined)
        .await
        .map_err(|e| SnapshotError::Write { path: quarantined.clone(), source: e })?;
    Ok(quarantined)
}

/// Write `snapshot` to `path` atomically: serialize to a sibling temp file,
/// then `rename` over the destination. `rename` within the same filesystem
/// is atomic, so readers (and a concurrent crash) only ever observe either
/// the old or the fully-written new content, never a partial file.
pub async fn write_atomic(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| SnapshotError::Write { path: path.to_path_buf(), source: e })?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("snapshot.json")
    ));
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| SnapshotError::Serialize { path: path.to_path_buf(), source: e })?;

    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| SnapshotError::Write { path: tmp_path.clone(), source: e })?;
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| SnapshotError::Write { path: path.to_path_buf(), source: e })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote snapshot");
    Ok(())
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
