// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Portage delivery engine.
//!
//! Pulls one normalized message at a time, formats it, sends it with the
//! token manager's credential, absorbs rate limiting and single-refresh
//! auth recovery, flushes the checkpoint after every outcome, and
//! enforces the error budget.

pub mod destination;
pub mod engine;

pub use destination::{DestinationClient, SendOutcome};
pub use engine::{DeliveryEngine, DeliveryState, RunSummary};
