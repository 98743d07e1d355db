// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery state machine.
//!
//! Strictly single-threaded and sequential: destination ordering must
//! match source chronological order, and the one shared credential is
//! mutated in place on refresh. Per message the machine moves
//! Pending -> Sending -> {Success, RateLimited, Unauthorized, Failed};
//! RateLimited re-enters Sending for the same index after the mandated
//! wait, Unauthorized allows at most one token refresh per index, and
//! Failed records against the error budget and advances.

use std::time::Duration;

use chrono::FixedOffset;
use portage_auth::TokenManager;
use portage_checkpoint::{CheckpointStore, DeliveryFailure};
use portage_core::{ExportMessage, PortageError};
use portage_format::{format_message, Locale};
use portage_source::MessageFeed;
use tracing::{debug, info, warn};

use crate::destination::{DestinationClient, SendOutcome};

/// States of the per-message delivery machine, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Sending,
    Success,
    RateLimited,
    Unauthorized,
    Failed,
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryState::Pending => write!(f, "pending"),
            DeliveryState::Sending => write!(f, "sending"),
            DeliveryState::Success => write!(f, "success"),
            DeliveryState::RateLimited => write!(f, "rate-limited"),
            DeliveryState::Unauthorized => write!(f, "unauthorized"),
            DeliveryState::Failed => write!(f, "failed"),
        }
    }
}

/// Final progress report for the operator.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub posted: usize,
    pub total: usize,
    pub errors: Vec<DeliveryFailure>,
}

/// Orchestrates one migration run over a normalized message feed.
pub struct DeliveryEngine {
    destination: DestinationClient,
    tokens: TokenManager,
    checkpoint: CheckpointStore,
    pacing: Duration,
    error_budget: usize,
    offset: FixedOffset,
    locale: Locale,
}

impl DeliveryEngine {
    pub fn new(
        destination: DestinationClient,
        tokens: TokenManager,
        checkpoint: CheckpointStore,
        pacing: Duration,
        error_budget: usize,
        offset: FixedOffset,
        locale: Locale,
    ) -> Self {
        Self {
            destination,
            tokens,
            checkpoint,
            pacing,
            error_budget,
            offset,
            locale,
        }
    }

    /// Deliver every unposted message in order, then finalize the
    /// checkpoint. Fatal halts leave the checkpoint at its last flushed
    /// state with `completed = false`.
    pub async fn run(mut self, feed: &MessageFeed) -> Result<RunSummary, PortageError> {
        let resume = self.checkpoint.state().resume_index();
        if resume > 0 {
            info!(
                resume,
                posted = self.checkpoint.state().posted,
                "resuming from checkpoint"
            );
        }

        for item in feed.iter_from(resume)? {
            let (index, message) = item?;
            self.deliver(index, &message).await?;
        }

        self.checkpoint.finalize()?;
        let summary = self.summary();
        info!(
            posted = summary.posted,
            total = summary.total,
            errors = summary.errors.len(),
            "migration completed"
        );
        Ok(summary)
    }

    /// Drive one message to a terminal outcome.
    async fn deliver(&mut self, index: usize, message: &ExportMessage) -> Result<(), PortageError> {
        let body = format_message(message, self.offset, self.locale);
        let sender = message.sender.clone().unwrap_or_default();
        let mut refreshed = false;

        loop {
            debug!(index, state = %DeliveryState::Sending, sender = %sender, "delivering message");
            match self.destination.post_message(self.tokens.current(), &body).await {
                SendOutcome::Delivered => {
                    self.checkpoint.record_success(index)?;
                    debug!(index, state = %DeliveryState::Success, "message delivered");
                    tokio::time::sleep(self.pacing).await;
                    return Ok(());
                }
                SendOutcome::RateLimited { wait } => {
                    // The index never advances here; nothing else is sent
                    // during the wait.
                    warn!(
                        index,
                        state = %DeliveryState::RateLimited,
                        wait_secs = wait.as_secs(),
                        "destination throttled, waiting"
                    );
                    tokio::time::sleep(wait).await;
                }
                SendOutcome::Unauthorized => {
                    if refreshed {
                        // The refreshed credential was itself rejected:
                        // the credential is invalid, not stale.
                        return Err(PortageError::Auth {
                            message: format!(
                                "destination rejected a freshly refreshed token at message {index}"
                            ),
                        });
                    }
                    info!(
                        index,
                        state = %DeliveryState::Unauthorized,
                        "access token rejected, refreshing"
                    );
                    self.tokens.refresh().await?;
                    refreshed = true;
                }
                SendOutcome::Failed { reason } => {
                    if self.checkpoint.error_count() >= self.error_budget {
                        return Err(PortageError::TooManyErrors {
                            recorded: self.checkpoint.error_count(),
                            budget: self.error_budget,
                        });
                    }
                    warn!(
                        index,
                        state = %DeliveryState::Failed,
                        reason = %reason,
                        "delivery failed, recorded against error budget"
                    );
                    self.checkpoint.record_error(index, &sender, &reason)?;
                    return Ok(());
                }
            }
        }
    }

    /// Snapshot of progress from the checkpoint state.
    pub fn summary(&self) -> RunSummary {
        let state = self.checkpoint.state();
        RunSummary {
            posted: state.posted,
            total: state.total,
            errors: state.errors.clone(),
        }
    }
}
