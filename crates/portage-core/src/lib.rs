// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Portage migration engine.
//!
//! Provides the error taxonomy and the wire types shared by the source
//! normalizer, token manager, formatter, checkpoint store, and delivery
//! engine crates.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PortageError;
pub use types::{ContentKind, Credential, ExportMessage};
