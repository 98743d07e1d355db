// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential cache and token lifecycle for the Portage migration engine.
//!
//! One credential, loaded once, refreshed reactively after an
//! unauthorized delivery response, persisted atomically on every
//! refresh.

pub mod manager;

pub use manager::TokenManager;
