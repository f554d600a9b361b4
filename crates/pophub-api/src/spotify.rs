// Spotify (albums) API client - every call needs a bearer token
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::CredentialManager;
use crate::error::{ApiError, Result};
use crate::gateway::FetchGateway;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

pub struct SpotifyClient {
    gateway: Arc<FetchGateway>,
    credentials: Option<Arc<CredentialManager>>,
    base_url: String,
}

impl SpotifyClient {
    /// `credentials` is `None` when no client id/secret is configured
    pub fn new(gateway: Arc<FetchGateway>, credentials: Option<Arc<CredentialManager>>) -> Self {
        Self::with_base_url(gateway, credentials, SPOTIFY_API_BASE.to_string())
    }

    pub fn with_base_url(
        gateway: Arc<FetchGateway>,
        credentials: Option<Arc<CredentialManager>>,
        base_url: String,
    ) -> Self {
        Self {
            gateway,
            credentials,
            base_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn auth_headers(&self) -> Result<HeaderMap> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ApiError::Unconfigured("Spotify"))?;
        let token = credentials.token().await?;

        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::AuthExchange(format!("Unusable token: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let headers = self.auth_headers().await?;
        self.gateway.fetch_cached(url, headers).await
    }

    /// Album search; tracks and artists are never requested
    pub async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<SpotifyAlbum>> {
        let url = format!(
            "{}/search?type=album&q={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        );
        let response: SpotifySearch = serde_json::from_value(self.fetch(&url).await?)?;
        Ok(response.albums.map(|page| page.items).unwrap_or_default())
    }

    /// Raw album payload
    pub async fn album(&self, id: &str) -> Result<Value> {
        let url = format!("{}/albums/{}", self.base_url, urlencoding::encode(id));
        self.fetch(&url).await
    }

    pub async fn album_detail(&self, id: &str) -> Result<SpotifyAlbum> {
        Ok(serde_json::from_value(self.album(id).await?)?)
    }

    /// An artist's full-length albums (singles and compilations excluded)
    pub async fn artist_albums(&self, artist_id: &str, limit: u32) -> Result<Vec<SpotifyAlbum>> {
        let url = format!(
            "{}/artists/{}/albums?include_groups=album&limit={}",
            self.base_url,
            urlencoding::encode(artist_id),
            limit
        );
        let page: SpotifyPaging = serde_json::from_value(self.fetch(&url).await?)?;
        Ok(page.items)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SpotifySearch {
    albums: Option<SpotifyPaging>,
}

#[derive(Debug, Clone, Deserialize)]
struct SpotifyPaging {
    #[serde(default)]
    items: Vec<SpotifyAlbum>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl SpotifyAlbum {
    pub fn cover_url(&self) -> String {
        self.images
            .first()
            .map(|img| img.url.clone())
            .unwrap_or_default()
    }

    pub fn artist_names(&self) -> Vec<String> {
        self.artists.iter().map(|a| a.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pophub_cache::CacheManager;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SpotifyClient {
        let store = Arc::new(CacheManager::in_memory().unwrap());
        let gateway = Arc::new(FetchGateway::new(store, chrono::Duration::hours(1)).unwrap());
        let creds = CredentialManager::with_token_url(
            reqwest::Client::new(),
            "id".into(),
            "secret".into(),
            format!("{}/api/token", server.uri()),
        );
        creds
            .prime("tok".into(), Utc::now() + chrono::Duration::hours(1))
            .await;
        SpotifyClient::with_base_url(gateway, Some(Arc::new(creds)), server.uri())
    }

    #[tokio::test]
    async fn test_search_albums_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "album"))
            .and(query_param("q", "abbey road"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "albums": {"items": [{
                    "id": "0ETFjACtuP2ADo6LFhL6HN",
                    "name": "Abbey Road",
                    "release_date": "1969-09-26",
                    "artists": [{"id": "3WrFJ7ztbogyGnTHbHJFl2", "name": "The Beatles"}],
                    "images": [{"url": "https://i.scdn.co/image/abbey"}]
                }]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let albums = client(&server).await.search_albums("abbey road", 10).await.unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].cover_url(), "https://i.scdn.co/image/abbey");
        assert_eq!(albums[0].artist_names(), vec!["The Beatles"]);
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let store = Arc::new(CacheManager::in_memory().unwrap());
        let gateway = Arc::new(FetchGateway::new(store, chrono::Duration::hours(1)).unwrap());
        let spotify = SpotifyClient::new(gateway, None);

        assert!(!spotify.is_configured());
        let err = spotify.album("x").await.unwrap_err();
        assert!(matches!(err, ApiError::Unconfigured("Spotify")));
    }

    #[test]
    fn test_album_without_images_has_empty_cover() {
        let album: SpotifyAlbum = serde_json::from_value(json!({"id": "a", "name": "b"})).unwrap();
        assert_eq!(album.cover_url(), "");
        assert!(album.artist_names().is_empty());
    }
}
