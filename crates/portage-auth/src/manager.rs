// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token manager: owns the persisted credential cache and performs the
//! refresh-token exchange.
//!
//! Refresh is reactive: the delivery engine calls [`TokenManager::refresh`]
//! only after the destination reports unauthorized, never on a timer. A
//! successful exchange replaces both tokens together and rewrites the
//! cache file atomically.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portage_core::{Credential, PortageError};
use serde::Deserialize;
use tracing::{debug, info};

/// Token endpoint response for a refresh-token grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Some providers omit this and expect the old refresh token reused.
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

/// Owns the process's single credential and its on-disk cache.
#[derive(Debug)]
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    cache_path: PathBuf,
    credential: Credential,
}

impl TokenManager {
    /// Load the credential cache once at startup.
    ///
    /// The cache must resolve to exactly one credential; a multi-entry
    /// cache is rejected rather than silently picking one.
    pub fn load(cache_path: impl AsRef<Path>, token_url: &str) -> Result<Self, PortageError> {
        let cache_path = cache_path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&cache_path).map_err(|e| {
            PortageError::Config(format!(
                "cannot read credential cache {}: {e}",
                cache_path.display()
            ))
        })?;
        let credential = parse_cache(&content, &cache_path)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PortageError::Internal(format!("failed to build HTTP client: {e}")))?;

        debug!(
            tenant = %credential.tenant,
            cache = %cache_path.display(),
            "credential cache loaded"
        );
        Ok(Self {
            http,
            token_url: token_url.to_string(),
            cache_path,
            credential,
        })
    }

    /// Override the client identifier from configuration.
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        if let Some(id) = client_id {
            self.credential.client_id = id;
        }
        self
    }

    /// The cached access token. Never performs network I/O: a stale
    /// token surfaces as a 401 downstream, which is what triggers
    /// [`refresh`](Self::refresh).
    pub fn current(&self) -> &str {
        &self.credential.access_token
    }

    /// Realm/tenant identifier of the cached credential.
    pub fn tenant(&self) -> &str {
        &self.credential.tenant
    }

    /// Exchange the refresh token for a new access/refresh pair, replace
    /// both in memory, and rewrite the cache file atomically.
    pub async fn refresh(&mut self) -> Result<(), PortageError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credential.refresh_token.as_str()),
                ("client_id", self.credential.client_id.as_str()),
                ("tenant", self.credential.tenant.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PortageError::Auth {
                message: format!("token endpoint unreachable: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortageError::Auth {
                message: format!("refresh-token exchange rejected ({status}): {body}"),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| PortageError::Auth {
            message: format!("malformed token endpoint response: {e}"),
        })?;

        self.credential.access_token = token.access_token;
        if let Some(refresh_token) = token.refresh_token {
            self.credential.refresh_token = refresh_token;
        }
        self.credential.expires_at = token
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp() + secs as i64);

        self.persist()?;
        info!(tenant = %self.credential.tenant, "access token refreshed");
        Ok(())
    }

    /// Atomic whole-file rewrite of the credential cache: a concurrent
    /// reader sees either the old pair or the new pair, never a mix.
    fn persist(&self) -> Result<(), PortageError> {
        let json = serde_json::to_string_pretty(&self.credential)
            .map_err(|e| PortageError::Internal(format!("credential serialization: {e}")))?;

        let dir = self.cache_path.parent().unwrap_or_else(|| Path::new("."));
        let io_err = |e: std::io::Error| {
            PortageError::Config(format!(
                "cannot rewrite credential cache {}: {e}",
                self.cache_path.display()
            ))
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.cache_path).map_err(|e| {
            PortageError::Config(format!(
                "cannot rewrite credential cache {}: {e}",
                self.cache_path.display()
            ))
        })?;
        Ok(())
    }
}

/// Parse the cache file: either a single credential object or an array
/// holding exactly one.
fn parse_cache(content: &str, path: &Path) -> Result<Credential, PortageError> {
    if let Ok(credential) = serde_json::from_str::<Credential>(content) {
        return Ok(credential);
    }
    let entries: Vec<Credential> = serde_json::from_str(content).map_err(|e| {
        PortageError::Config(format!(
            "credential cache {} is neither a credential nor a credential array: {e}",
            path.display()
        ))
    })?;
    match entries.len() {
        1 => Ok(entries.into_iter().next().unwrap()),
        0 => Err(PortageError::Config(format!(
            "credential cache {} is empty",
            path.display()
        ))),
        n => Err(PortageError::Config(format!(
            "credential cache {} is ambiguous: {n} entries, expected exactly one",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_cache(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn single_cache(dir: &tempfile::TempDir) -> PathBuf {
        write_cache(
            dir,
            r#"{
                "accessToken": "old-access",
                "refreshToken": "old-refresh",
                "tenant": "acme",
                "clientId": "client-1"
            }"#,
        )
    }

    #[test]
    fn current_returns_cached_token_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = single_cache(&dir);
        let manager = TokenManager::load(&cache, "https://unreachable.invalid/token").unwrap();
        assert_eq!(manager.current(), "old-access");
        assert_eq!(manager.tenant(), "acme");
    }

    #[test]
    fn single_entry_array_cache_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = write_cache(
            &dir,
            r#"[{
                "accessToken": "a",
                "refreshToken": "r",
                "tenant": "acme",
                "clientId": "c"
            }]"#,
        );
        let manager = TokenManager::load(&cache, "https://unreachable.invalid/token").unwrap();
        assert_eq!(manager.current(), "a");
    }

    #[test]
    fn ambiguous_cache_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = write_cache(
            &dir,
            r#"[
                {"accessToken": "a1", "refreshToken": "r1", "tenant": "t", "clientId": "c"},
                {"accessToken": "a2", "refreshToken": "r2", "tenant": "t", "clientId": "c"}
            ]"#,
        );
        let err = TokenManager::load(&cache, "https://unreachable.invalid/token").unwrap_err();
        assert!(err.to_string().contains("ambiguous"), "got: {err}");
    }

    #[tokio::test]
    async fn refresh_rotates_pair_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("tenant=acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = single_cache(&dir);
        let mut manager =
            TokenManager::load(&cache, &format!("{}/token", server.uri())).unwrap();

        manager.refresh().await.unwrap();
        assert_eq!(manager.current(), "new-access");

        // Both tokens must be replaced together in the cache file.
        let persisted: Credential =
            serde_json::from_str(&std::fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(persisted.access_token, "new-access");
        assert_eq!(persisted.refresh_token, "new-refresh");
        assert!(persisted.expires_at.is_some());
    }

    #[tokio::test]
    async fn refresh_preserves_refresh_token_when_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = single_cache(&dir);
        let mut manager =
            TokenManager::load(&cache, &format!("{}/token", server.uri())).unwrap();

        manager.refresh().await.unwrap();

        let persisted: Credential =
            serde_json::from_str(&std::fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(persisted.access_token, "new-access");
        assert_eq!(persisted.refresh_token, "old-refresh");
    }

    #[tokio::test]
    async fn rejected_exchange_is_auth_error_and_cache_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = single_cache(&dir);
        let before = std::fs::read_to_string(&cache).unwrap();
        let mut manager =
            TokenManager::load(&cache, &format!("{}/token", server.uri())).unwrap();

        let err = manager.refresh().await.unwrap_err();
        assert!(matches!(err, PortageError::Auth { .. }));
        assert!(err.to_string().contains("invalid_grant"), "got: {err}");
        // The in-memory token and the cache both keep the old pair.
        assert_eq!(manager.current(), "old-access");
        assert_eq!(std::fs::read_to_string(&cache).unwrap(), before);
    }

    #[tokio::test]
    async fn client_id_override_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("client_id=override-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = single_cache(&dir);
        let mut manager = TokenManager::load(&cache, &format!("{}/token", server.uri()))
            .unwrap()
            .with_client_id(Some("override-9".to_string()));

        manager.refresh().await.unwrap();
        assert_eq!(manager.current(), "new-access");
    }
}
