use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ApiError, Result};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens this close to expiry are treated as already expired
pub const REFRESH_MARGIN_SECS: i64 = 30;

/// A bearer token and the moment it stops working
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Client-credentials token holder for a single provider
///
/// The stored credential lives behind one async mutex that stays held for
/// the whole exchange, so readers only ever see a complete old token or a
/// complete new one. Concurrent callers that all find the token stale queue
/// up behind the first refresh instead of racing it.
pub struct CredentialManager {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    state: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(client: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self::with_token_url(client, client_id, client_secret, SPOTIFY_TOKEN_URL.to_string())
    }

    /// Point the exchange somewhere else (tests, proxies)
    pub fn with_token_url(
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
        token_url: String,
    ) -> Self {
        Self {
            client,
            token_url,
            client_id,
            client_secret,
            state: Mutex::new(None),
        }
    }

    /// Return a usable bearer token, exchanging for a new one if needed
    pub async fn token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(current) = state.as_ref() {
            if !current.needs_refresh_at(Utc::now()) {
                debug!("Reusing bearer token (expires {})", current.expires_at);
                return Ok(current.token.clone());
            }
        }

        let fresh = self.exchange().await?;
        info!("Refreshed bearer token, valid until {}", fresh.expires_at);

        let token = fresh.token.clone();
        *state = Some(fresh);
        Ok(token)
    }

    /// Seed the manager with a token obtained elsewhere
    pub async fn prime(&self, token: String, expires_at: DateTime<Utc>) {
        *self.state.lock().await = Some(Credential { token, expires_at });
    }

    /// Snapshot of the stored credential, if any
    pub async fn current(&self) -> Option<Credential> {
        self.state.lock().await.clone()
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            credentials.as_bytes(),
        );
        format!("Basic {}", encoded)
    }

    async fn exchange(&self) -> Result<Credential> {
        let response = self
            .client
            .post(&self.token_url)
            .header(AUTHORIZATION, self.basic_auth_header())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| ApiError::AuthExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::AuthExchange(format!("Status {}: {}", status, body)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::AuthExchange(format!("Malformed token response: {}", e)))?;

        Ok(Credential {
            token: body.access_token,
            expires_at: Utc::now() + Duration::seconds(body.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(server: &MockServer) -> CredentialManager {
        CredentialManager::with_token_url(
            reqwest::Client::new(),
            "id".to_string(),
            "secret".to_string(),
            format!("{}/api/token", server.uri()),
        )
    }

    async fn mount_token_endpoint(server: &MockServer, times: u64) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            // base64("id:secret")
            .and(header("authorization", "Basic aWQ6c2VjcmV0"))
            .and(body_string("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_absent_token_triggers_exchange() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 1).await;

        let creds = manager(&server);
        assert_eq!(creds.token().await.unwrap(), "fresh-token");
        // second call reuses what we just stored
        assert_eq!(creds.token().await.unwrap(), "fresh-token");
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refreshed() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 1).await;

        let creds = manager(&server);
        creds
            .prime("old-token".into(), Utc::now() + Duration::seconds(20))
            .await;

        assert_eq!(creds.token().await.unwrap(), "fresh-token");
        let stored = creds.current().await.unwrap();
        assert!(stored.expires_at > Utc::now() + Duration::seconds(3000));
    }

    #[tokio::test]
    async fn test_token_outside_margin_is_reused() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 0).await;

        let creds = manager(&server);
        creds
            .prime("old-token".into(), Utc::now() + Duration::seconds(60))
            .await;

        assert_eq!(creds.token().await.unwrap(), "old-token");
    }

    #[tokio::test]
    async fn test_failed_exchange_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .expect(1)
            .mount(&server)
            .await;

        let creds = manager(&server);
        let err = creds.token().await.unwrap_err();

        assert!(matches!(err, ApiError::AuthExchange(_)));
        assert!(creds.current().await.is_none());
    }

    #[test]
    fn test_refresh_margin() {
        let now = Utc::now();
        let cred = |secs| Credential {
            token: "t".into(),
            expires_at: now + Duration::seconds(secs),
        };

        assert!(cred(20).needs_refresh_at(now));
        assert!(cred(30).needs_refresh_at(now));
        assert!(!cred(31).needs_refresh_at(now));
        assert!(cred(-5).needs_refresh_at(now));
    }
}
