// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpoint persistence with whole-file atomic replacement.
//!
//! Every recorded outcome rewrites the entire checkpoint file via a temp
//! file in the same directory followed by a rename, so a crash mid-write
//! never leaves a partially written record observable on the next load.

use std::io::Write;
use std::path::{Path, PathBuf};

use portage_core::PortageError;
use tracing::{debug, info, warn};

use crate::state::{Checkpoint, DeliveryFailure};

/// Owns the checkpoint file and the in-memory copy of its state.
///
/// A single store instance is assumed to operate against a given path at
/// a time; no file locking is performed.
pub struct CheckpointStore {
    path: PathBuf,
    state: Checkpoint,
}

impl CheckpointStore {
    /// Load the checkpoint at `path`, or create a zero-state one for a
    /// run over `total` messages if none exists.
    ///
    /// A stored `total` differing from the current export count is
    /// overwritten (the export is the source of truth); progress fields
    /// are kept.
    pub fn open(path: impl AsRef<Path>, total: usize) -> Result<Self, PortageError> {
        let path = path.as_ref().to_path_buf();
        let mut fresh = false;
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let mut loaded: Checkpoint =
                    serde_json::from_str(&content).map_err(|e| PortageError::Checkpoint {
                        source: Box::new(e),
                    })?;
                if loaded.total != total {
                    warn!(
                        stored = loaded.total,
                        current = total,
                        "checkpoint total differs from export, using export count"
                    );
                    loaded.total = total;
                }
                info!(
                    last_posted = loaded.last_posted,
                    posted = loaded.posted,
                    errors = loaded.errors.len(),
                    "checkpoint loaded"
                );
                loaded
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no checkpoint found, starting fresh");
                fresh = true;
                Checkpoint::fresh(total)
            }
            Err(e) => {
                return Err(PortageError::Checkpoint {
                    source: Box::new(e),
                })
            }
        };
        let store = Self { path, state };
        if fresh {
            store.flush()?;
        }
        Ok(store)
    }

    /// Read the checkpoint at `path` without creating one.
    pub fn read(path: impl AsRef<Path>) -> Result<Checkpoint, PortageError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| PortageError::Checkpoint {
                source: Box::new(e),
            })?;
        serde_json::from_str(&content).map_err(|e| PortageError::Checkpoint {
            source: Box::new(e),
        })
    }

    /// Current in-memory state.
    pub fn state(&self) -> &Checkpoint {
        &self.state
    }

    /// Count of failures recorded so far.
    pub fn error_count(&self) -> usize {
        self.state.errors.len()
    }

    /// Record a successful delivery of message `index` and flush.
    pub fn record_success(&mut self, index: usize) -> Result<(), PortageError> {
        let index = index as i64;
        if index < self.state.last_posted {
            warn!(
                index,
                last_posted = self.state.last_posted,
                "out-of-order success record ignored"
            );
            return Ok(());
        }
        self.state.last_posted = index;
        self.state.posted += 1;
        self.flush()
    }

    /// Record a per-message delivery failure and flush. Does not advance
    /// `last_posted`.
    pub fn record_error(
        &mut self,
        index: usize,
        sender: &str,
        message: &str,
    ) -> Result<(), PortageError> {
        self.state.errors.push(DeliveryFailure {
            index,
            sender: sender.to_string(),
            message: message.to_string(),
        });
        self.flush()
    }

    /// Write the terminal state: `completed = true` plus a completion
    /// timestamp. Called exactly once, on normal completion.
    pub fn finalize(&mut self) -> Result<(), PortageError> {
        self.state.completed = true;
        self.state.completed_at = Some(
            chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        );
        self.flush()
    }

    /// Synchronous whole-file overwrite: serialize, write to a temp file
    /// in the checkpoint's directory, fsync, rename over the target.
    fn flush(&self) -> Result<(), PortageError> {
        let json =
            serde_json::to_string_pretty(&self.state).map_err(|e| PortageError::Checkpoint {
                source: Box::new(e),
            })?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(checkpoint_io)?;
        tmp.write_all(json.as_bytes()).map_err(checkpoint_io)?;
        tmp.as_file().sync_all().map_err(checkpoint_io)?;
        tmp.persist(&self.path).map_err(|e| PortageError::Checkpoint {
            source: Box::new(e),
        })?;

        debug!(
            last_posted = self.state.last_posted,
            posted = self.state.posted,
            errors = self.state.errors.len(),
            "checkpoint flushed"
        );
        Ok(())
    }
}

fn checkpoint_io(e: std::io::Error) -> PortageError {
    PortageError::Checkpoint {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(dir: &tempfile::TempDir, total: usize) -> CheckpointStore {
        CheckpointStore::open(dir.path().join("state.json"), total).unwrap()
    }

    #[test]
    fn open_without_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, 7);
        assert_eq!(store.state().last_posted, -1);
        assert_eq!(store.state().total, 7);
        assert_eq!(store.state().resume_index(), 0);
    }

    #[test]
    fn record_success_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = CheckpointStore::open(&path, 3).unwrap();
        store.record_success(0).unwrap();
        store.record_success(1).unwrap();

        let reopened = CheckpointStore::open(&path, 3).unwrap();
        assert_eq!(reopened.state().last_posted, 1);
        assert_eq!(reopened.state().posted, 2);
        assert_eq!(reopened.state().resume_index(), 2);
    }

    #[test]
    fn record_error_appends_without_advancing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir, 3);
        store.record_success(0).unwrap();
        store.record_error(1, "alice", "destination returned 500").unwrap();

        assert_eq!(store.state().last_posted, 0);
        assert_eq!(store.error_count(), 1);
        assert_eq!(store.state().errors[0].index, 1);
        assert_eq!(store.state().errors[0].sender, "alice");
    }

    #[test]
    fn flush_overwrites_rather_than_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = CheckpointStore::open(&path, 5).unwrap();
        for i in 0..5 {
            store.record_success(i).unwrap();
        }

        // After five flushes the file must still be a single JSON object.
        let content = std::fs::read_to_string(&path).unwrap();
        let cp: Checkpoint = serde_json::from_str(&content).unwrap();
        assert_eq!(cp.last_posted, 4);
        assert_eq!(cp.posted, 5);
    }

    #[test]
    fn finalize_sets_terminal_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = CheckpointStore::open(&path, 1).unwrap();
        store.record_success(0).unwrap();
        store.finalize().unwrap();

        let cp = CheckpointStore::read(&path).unwrap();
        assert!(cp.completed);
        assert!(cp.completed_at.is_some());
    }

    #[test]
    fn out_of_order_success_does_not_regress() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir, 5);
        store.record_success(3).unwrap();
        store.record_success(1).unwrap();
        assert_eq!(store.state().last_posted, 3);
    }

    #[test]
    fn total_mismatch_prefers_export_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = CheckpointStore::open(&path, 3).unwrap();
        store.record_success(0).unwrap();

        let reopened = CheckpointStore::open(&path, 4).unwrap();
        assert_eq!(reopened.state().total, 4);
        assert_eq!(reopened.state().last_posted, 0);
    }
}
