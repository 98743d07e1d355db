// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable delivery-progress checkpoint for the Portage migration engine.
//!
//! The checkpoint file (JSON) is both an input (on resume) and an output
//! (after every delivery outcome). Each write is a full synchronous
//! overwrite via temp-file-then-rename, giving at-least-once delivery
//! semantics across abrupt process termination.

pub mod state;
pub mod store;

pub use state::{Checkpoint, DeliveryFailure};
pub use store::CheckpointStore;
