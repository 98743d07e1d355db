// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source normalization for the Portage migration engine.
//!
//! Turns a raw, newest-first paginated export into the single ascending,
//! filtered sequence the delivery engine consumes, spill-staging
//! oversized exports to disk.

pub mod feed;
pub mod normalize;

pub use feed::{open_export, stage_to_spill, FeedIter, MessageFeed};
pub use normalize::{load_export, normalize};
