// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the destination's message-creation endpoint.
//!
//! Classifies every attempt into one of four outcomes the delivery
//! state machine dispatches on. Transport-level request errors are
//! `Failed` like any other non-success response: an unattended run must
//! not abort on a single reset socket.

use std::time::Duration;

use portage_core::PortageError;
use tracing::debug;

/// Wait applied when a 429 arrives without a parsable Retry-After header.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(5);

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// 2xx: the message is on the destination.
    Delivered,
    /// 429: the destination demands a wait before the same message is
    /// retried.
    RateLimited { wait: Duration },
    /// 401: the access token must be refreshed.
    Unauthorized,
    /// Anything else, including transport errors. Counts against the
    /// error budget.
    Failed { reason: String },
}

/// Client for posting formatted messages into one destination room.
#[derive(Debug, Clone)]
pub struct DestinationClient {
    http: reqwest::Client,
    messages_url: String,
}

impl DestinationClient {
    /// Creates a client for the room's message-creation endpoint.
    pub fn new(base_url: &str, room_id: &str) -> Result<Self, PortageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| PortageError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            messages_url: format!("{}/rooms/{}/messages", base_url.trim_end_matches('/'), room_id),
        })
    }

    /// POST one formatted body with a bearer credential and classify the
    /// response.
    pub async fn post_message(&self, token: &str, html: &str) -> SendOutcome {
        let result = self
            .http
            .post(&self.messages_url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "format": "html", "content": html }))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return SendOutcome::Failed {
                    reason: format!("request failed: {e}"),
                }
            }
        };

        let status = response.status();
        debug!(status = %status, "destination response received");

        if status.is_success() {
            return SendOutcome::Delivered;
        }
        match status.as_u16() {
            429 => SendOutcome::RateLimited {
                wait: retry_after(&response),
            },
            401 => SendOutcome::Unauthorized,
            _ => {
                let body = response.text().await.unwrap_or_default();
                SendOutcome::Failed {
                    reason: format!("destination returned {status}: {body}"),
                }
            }
        }
    }
}

/// Extract the mandatory wait from a 429's Retry-After header (seconds).
fn retry_after(response: &reqwest::Response) -> Duration {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
}
