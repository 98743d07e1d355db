// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpoint record types.
//!
//! The checkpoint file is the canonical mechanism for idempotent restart:
//! `lastPosted` is the sole source of truth for the resume position.

use serde::{Deserialize, Serialize};

/// One per-message delivery failure, appended after retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFailure {
    /// Position of the failed message in the normalized ascending list.
    pub index: usize,
    /// Sender of the failed message, for operator diagnosis.
    pub sender: String,
    /// Destination/client error description.
    pub message: String,
}

/// Durable record of delivery progress.
///
/// `last_posted` is monotonically non-decreasing across the life of a run
/// and across restarts; resume position is always `last_posted + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Index of the last successfully delivered message, -1 if none.
    pub last_posted: i64,
    /// Total messages in the normalized export.
    pub total: usize,
    /// Count of successfully delivered messages.
    pub posted: usize,
    /// Per-message failures recorded so far, in delivery order.
    #[serde(default)]
    pub errors: Vec<DeliveryFailure>,
    /// True only after a normal completion.
    #[serde(default)]
    pub completed: bool,
    /// Completion timestamp, set once on normal completion.
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Checkpoint {
    /// A zero-state checkpoint for a fresh run over `total` messages.
    pub fn fresh(total: usize) -> Self {
        Self {
            last_posted: -1,
            total,
            posted: 0,
            errors: Vec::new(),
            completed: false,
            completed_at: None,
        }
    }

    /// First index that still needs delivery.
    pub fn resume_index(&self) -> usize {
        (self.last_posted + 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_checkpoint_resumes_at_zero() {
        let cp = Checkpoint::fresh(10);
        assert_eq!(cp.last_posted, -1);
        assert_eq!(cp.resume_index(), 0);
        assert!(!cp.completed);
    }

    #[test]
    fn resume_index_follows_last_posted() {
        let mut cp = Checkpoint::fresh(10);
        cp.last_posted = 4;
        assert_eq!(cp.resume_index(), 5);
    }

    #[test]
    fn checkpoint_uses_wire_key_names() {
        let cp = Checkpoint::fresh(3);
        let json = serde_json::to_string(&cp).unwrap();
        assert!(json.contains("\"lastPosted\":-1"), "got: {json}");
        assert!(json.contains("\"completedAt\""), "got: {json}");
    }

    #[test]
    fn checkpoint_parses_minimal_file() {
        let json = r#"{"lastPosted": 1, "total": 3, "posted": 2}"#;
        let cp: Checkpoint = serde_json::from_str(json).unwrap();
        assert_eq!(cp.resume_index(), 2);
        assert!(cp.errors.is_empty());
        assert!(cp.completed_at.is_none());
    }
}
