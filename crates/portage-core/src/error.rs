// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Portage migration engine.

use thiserror::Error;

/// The primary error type used across all Portage crates.
///
/// Rate limiting is deliberately absent: a 429 from the destination is a
/// transient condition the delivery engine resolves by waiting, and it
/// never escapes the engine loop.
#[derive(Debug, Error)]
pub enum PortageError {
    /// Configuration errors (invalid TOML, ambiguous credential cache,
    /// unparsable timezone/locale).
    #[error("configuration error: {0}")]
    Config(String),

    /// Fatal authentication failure: the refresh-token exchange was
    /// rejected, or the destination returned unauthorized twice for the
    /// same message after a refresh.
    #[error("authentication error: {message}")]
    Auth { message: String },

    /// Export loading, parsing, or spill-staging failure.
    #[error("export error: {message}")]
    Export {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Checkpoint file could not be read or flushed. Fatal: without a
    /// durable checkpoint the run cannot guarantee resumability.
    #[error("checkpoint error: {source}")]
    Checkpoint {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A transport-level delivery failure surfaced by the destination
    /// client. The engine records these per message; they only become
    /// fatal through the error budget.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The accumulated per-message failure count exceeded the budget.
    #[error("aborting after {recorded} recorded delivery failures (budget {budget})")]
    TooManyErrors { recorded: usize, budget: usize },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortageError {
    /// True for the variants that must halt the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PortageError::Delivery { .. })
    }
}
