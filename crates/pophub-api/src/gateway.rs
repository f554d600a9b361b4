// Cached outbound fetches - every provider call goes through here
use std::sync::Arc;
use std::time::Duration;

use pophub_cache::ResponseStore;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{ApiError, Result};

/// Hard ceiling on a single upstream request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Query parameters that carry secrets and must never show up in logs
const SECRET_PARAMS: &[&str] = &["api_key", "key"];

/// Decides which cache key a request lands under
pub trait CacheKeyStrategy: Send + Sync {
    fn key(&self, url: &str, headers: &HeaderMap) -> String;
}

/// Keys on the URL alone.
///
/// Header-carried credentials are ignored, so two requests that differ only
/// by their bearer token share one entry. Swap in [`AuthScopedKey`] if that
/// matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlKey;

impl CacheKeyStrategy for UrlKey {
    fn key(&self, url: &str, _headers: &HeaderMap) -> String {
        url.to_string()
    }
}

/// Keys on the URL plus a SHA-256 digest of the Authorization header
///
/// Keys end up on disk, so the digest has to be stable across builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthScopedKey;

impl CacheKeyStrategy for AuthScopedKey {
    fn key(&self, url: &str, headers: &HeaderMap) -> String {
        match headers.get(AUTHORIZATION) {
            Some(auth) => {
                let digest = Sha256::digest(auth.as_bytes());
                let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
                format!("{}#auth={}", url, hex)
            }
            None => url.to_string(),
        }
    }
}

/// Build the HTTP client every gateway and token exchange shares
pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent("PopHub/0.1.0")
        .timeout(HTTP_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Mask secret query values so a URL is safe to log or put in an error
pub fn redact(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SECRET_PARAMS.contains(&name) => format!("{}=***", name),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base, query)
}

/// Cache-first HTTP fetcher
///
/// A fresh cache entry short-circuits the network entirely. On a miss (or a
/// stale entry) the request goes out, non-2xx is a hard failure, and the
/// decoded body is upserted before it is returned. Cache trouble is logged
/// and otherwise ignored: caching is best-effort, fetching is not.
pub struct FetchGateway {
    client: reqwest::Client,
    store: Arc<dyn ResponseStore>,
    ttl: chrono::Duration,
    keys: Box<dyn CacheKeyStrategy>,
}

impl FetchGateway {
    pub fn new(store: Arc<dyn ResponseStore>, ttl: chrono::Duration) -> Result<Self> {
        Ok(Self::with_client(http_client()?, store, ttl))
    }

    pub fn with_client(
        client: reqwest::Client,
        store: Arc<dyn ResponseStore>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            client,
            store,
            ttl,
            keys: Box::new(UrlKey),
        }
    }

    /// Replace the default URL-only keying
    pub fn with_key_strategy<K: CacheKeyStrategy + 'static>(mut self, keys: K) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub async fn fetch_cached(&self, url: &str, headers: HeaderMap) -> Result<Value> {
        let key = self.keys.key(url, &headers);
        let shown = redact(url);

        match self.store.get(&key) {
            Ok(Some(entry)) if entry.is_fresh(self.ttl) => {
                debug!("Cache hit for {}", shown);
                return Ok(entry.payload);
            }
            Ok(Some(_)) => debug!("Stale cache entry for {}", shown),
            Ok(None) => debug!("Cache miss for {}", shown),
            Err(e) => warn!("Cache read failed for {}: {}", shown, e),
        }

        // reqwest errors carry the full URL, key included
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::RequestFailed { status, url: shown });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::NetworkError(e.without_url()))?;
        let payload: Value = serde_json::from_slice(&body)?;
        info!("Fetched {} from network", shown);

        if let Err(e) = self.store.put(&key, &payload) {
            warn!("Failed to cache {}: {}", shown, e);
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::mock;
    use pophub_cache::{CacheEntry, CacheError, CacheManager};
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mock! {
        Store {}
        impl ResponseStore for Store {
            fn get(&self, key: &str) -> pophub_cache::Result<Option<CacheEntry>>;
            fn put(&self, key: &str, payload: &Value) -> pophub_cache::Result<()>;
        }
    }

    fn gateway(store: Arc<CacheManager>) -> FetchGateway {
        FetchGateway::new(store, chrono::Duration::hours(1)).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "network"})))
            .expect(0)
            .mount(&server)
            .await;

        let url = format!("{}/search?q=batman", server.uri());
        let store = Arc::new(CacheManager::in_memory().unwrap());
        store.put(&url, &json!({"from": "cache"})).unwrap();

        let payload = gateway(store).fetch_cached(&url, HeaderMap::new()).await.unwrap();
        assert_eq!(payload, json!({"from": "cache"}));
    }

    #[tokio::test]
    async fn test_stale_entry_refetches_once_and_overwrites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "network"})))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/search?q=batman", server.uri());
        let store = Arc::new(CacheManager::in_memory().unwrap());
        let old = Utc::now() - chrono::Duration::hours(2);
        store.put_at(&url, &json!({"from": "cache"}), old).unwrap();

        let payload = gateway(store.clone())
            .fetch_cached(&url, HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(payload, json!({"from": "network"}));

        let entry = store.get(&url).unwrap().unwrap();
        assert_eq!(entry.payload, json!({"from": "network"}));
        assert!(entry.fetched_at > old);
    }

    #[tokio::test]
    async fn test_miss_populates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/games?search=zelda", server.uri());
        let store = Arc::new(CacheManager::in_memory().unwrap());
        let gw = gateway(store.clone());

        gw.fetch_cached(&url, HeaderMap::new()).await.unwrap();
        // second call is served from the cache
        gw.fetch_cached(&url, HeaderMap::new()).await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/movie/1?api_key=secret", server.uri());
        let store = Arc::new(CacheManager::in_memory().unwrap());

        let err = gateway(store.clone())
            .fetch_cached(&url, HeaderMap::new())
            .await
            .unwrap_err();

        match err {
            ApiError::RequestFailed { status, url } => {
                assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
                assert!(!url.contains("secret"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_put()
            .times(1)
            .returning(|_, _| Err(CacheError::LockPoisoned));

        let gw = FetchGateway::new(Arc::new(store), chrono::Duration::hours(1)).unwrap();
        let url = format!("{}/albums/1", server.uri());

        let payload = gw.fetch_cached(&url, HeaderMap::new()).await.unwrap();
        assert_eq!(payload, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let store = Arc::new(CacheManager::in_memory().unwrap());
        let url = format!("{}/games/1", server.uri());

        let err = gateway(store).fetch_cached(&url, HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_api_keys_never_reach_the_logs() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let store = Arc::new(CacheManager::in_memory().unwrap());
        let gw = gateway(store);
        let url = format!("{}/games?key=SECRET123&search=zelda", server.uri());

        // miss, network fetch, cache write, then a hit
        gw.fetch_cached(&url, HeaderMap::new()).await.unwrap();
        gw.fetch_cached(&url, HeaderMap::new()).await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Cached response"), "nothing captured: {}", output);
        assert!(output.contains("key=***"));
        assert!(!output.contains("SECRET123"), "secret leaked: {}", output);
    }

    #[test]
    fn test_url_key_ignores_auth_header() {
        let mut a = HeaderMap::new();
        a.insert(AUTHORIZATION, HeaderValue::from_static("Bearer one"));
        let mut b = HeaderMap::new();
        b.insert(AUTHORIZATION, HeaderValue::from_static("Bearer two"));

        let url = "https://api.spotify.com/v1/albums/x";
        assert_eq!(UrlKey.key(url, &a), UrlKey.key(url, &b));
        assert_ne!(AuthScopedKey.key(url, &a), AuthScopedKey.key(url, &b));
        assert_eq!(AuthScopedKey.key(url, &HeaderMap::new()), url);
    }

    #[test]
    fn test_auth_scoped_key_is_stable() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer one"));

        // first 8 bytes of sha256("Bearer one")
        let key = AuthScopedKey.key("https://a/x", &headers);
        let expected: String = Sha256::digest(b"Bearer one")[..8]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        assert_eq!(key, format!("https://a/x#auth={}", expected));
        assert_eq!(expected.len(), 16);
    }

    #[test]
    fn test_redact_masks_secret_params() {
        assert_eq!(
            redact("https://api.rawg.io/api/games?key=abc&search=zelda"),
            "https://api.rawg.io/api/games?key=***&search=zelda"
        );
        assert_eq!(
            redact("https://api.themoviedb.org/3/movie/1?api_key=abc"),
            "https://api.themoviedb.org/3/movie/1?api_key=***"
        );
        assert_eq!(redact("https://example.com/a"), "https://example.com/a");
    }
}
