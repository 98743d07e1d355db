// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message formatting for the Portage migration engine.
//!
//! Converts one source message into the destination's HTML wire body:
//! an attribution header (bold sender, italic localized timestamp), a
//! blank line, then the converted body.

pub mod markup;
pub mod stamp;

use chrono::FixedOffset;
use portage_core::{ContentKind, ExportMessage};

pub use markup::{escape_html, markdown_to_html, plain_to_html};
pub use stamp::{parse_offset, Locale};

/// Format one message for delivery. Pure: identical inputs always
/// produce byte-identical output.
///
/// Senderless records are filtered out during normalization, so an empty
/// sender here renders as an empty bold span rather than being an error.
pub fn format_message(msg: &ExportMessage, offset: FixedOffset, locale: Locale) -> String {
    let sender = escape_html(msg.sender.as_deref().unwrap_or_default());
    let when = locale.render(msg.created_at, offset);
    let body = match msg.content_type {
        ContentKind::Plain => plain_to_html(&msg.content),
        ContentKind::Markdown => markdown_to_html(&msg.content),
    };
    format!("<strong>{sender}</strong> <em>{when}</em><br /><br />{body}")
}
