// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types shared across the Portage workspace.
//!
//! `ExportMessage` matches the upstream export record shape (camelCase
//! keys, newest-first ordering at the source). `Credential` matches the
//! persisted token cache file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Markup dialect of a message body as exported from the source surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    /// Plain text; only entity escaping and line breaks apply.
    Plain,
    /// Lightweight markdown: bold/italic spans, links, images, code.
    #[default]
    Markdown,
}

/// One immutable record from the source export.
///
/// Records with no sender or an empty body are system/administrative
/// events (joins, renames) and are filtered out during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMessage {
    /// Display name of the author. `None` marks a system event.
    #[serde(default)]
    pub sender: Option<String>,
    /// Creation time at the source, UTC.
    pub created_at: DateTime<Utc>,
    /// Message body, possibly containing inline markup.
    #[serde(default)]
    pub content: String,
    /// Markup dialect of `content`.
    #[serde(default)]
    pub content_type: ContentKind,
    /// True when the message was deleted at the source.
    #[serde(default)]
    pub deleted: bool,
}

impl ExportMessage {
    /// True for records that represent actual user messages worth
    /// migrating: a sender is present and the body is non-blank.
    pub fn is_migratable(&self) -> bool {
        self.sender
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
            && !self.content.trim().is_empty()
    }
}

/// The persisted credential cache: one access/refresh token pair plus
/// the identifiers needed to exchange the refresh token.
///
/// On refresh both tokens are replaced together and the whole record is
/// rewritten atomically, so a concurrent reader never observes a
/// mismatched pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds after which the access token is stale. Informational:
    /// refresh is reactive (after a 401), never timer-driven.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Realm/tenant identifier sent with the token exchange.
    pub tenant: String,
    /// OAuth client identifier sent with the token exchange.
    pub client_id: String,
}
