// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chronological reconstruction of the upstream export.
//!
//! The upstream API only returns messages newest-first, page by page.
//! Delivery order must be oldest-first, so the concatenated pages are
//! reversed in memory, then filtered: records without a sender and
//! records with a blank body are system/administrative events, and
//! source-deleted records are excluded unless explicitly requested.

use std::path::Path;

use portage_core::{ExportMessage, PortageError};
use tracing::{debug, info};

/// Concatenate descending-ordered pages, reverse into ascending
/// chronological order, and filter out non-migratable records.
pub fn normalize(pages: Vec<Vec<ExportMessage>>, include_deleted: bool) -> Vec<ExportMessage> {
    let raw_count: usize = pages.iter().map(Vec::len).sum();

    let mut messages: Vec<ExportMessage> = pages.into_iter().flatten().collect();
    messages.reverse();
    messages.retain(|m| m.is_migratable() && (include_deleted || !m.deleted));

    info!(
        raw = raw_count,
        migratable = messages.len(),
        "export normalized"
    );
    messages
}

/// Read one export file: a JSON array of records in the upstream's
/// descending order.
pub fn load_export(path: impl AsRef<Path>) -> Result<Vec<ExportMessage>, PortageError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| PortageError::Export {
        message: format!("cannot read export file {}", path.display()),
        source: Some(Box::new(e)),
    })?;
    let page: Vec<ExportMessage> =
        serde_json::from_str(&content).map_err(|e| PortageError::Export {
            message: format!("export file {} is not a JSON message array", path.display()),
            source: Some(Box::new(e)),
        })?;
    debug!(records = page.len(), path = %path.display(), "export page loaded");
    Ok(page)
}
