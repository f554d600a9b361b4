// RAWG (video games) API client
use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::gateway::FetchGateway;

const RAWG_API_BASE: &str = "https://api.rawg.io/api";

pub struct RawgClient {
    gateway: Arc<FetchGateway>,
    api_key: Option<String>,
    base_url: String,
}

impl RawgClient {
    pub fn new(gateway: Arc<FetchGateway>, api_key: Option<String>) -> Self {
        Self::with_base_url(gateway, api_key, RAWG_API_BASE.to_string())
    }

    pub fn with_base_url(
        gateway: Arc<FetchGateway>,
        api_key: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            gateway,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(ApiError::Unconfigured("RAWG"))
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        self.gateway.fetch_cached(url, HeaderMap::new()).await
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<RawgGame>> {
        let page: RawgPage = serde_json::from_value(self.fetch(url).await?)?;
        Ok(page.results)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<RawgGame>> {
        let url = format!(
            "{}/games?key={}&search={}",
            self.base_url,
            self.key()?,
            urlencoding::encode(query)
        );
        self.fetch_page(&url).await
    }

    /// Raw game payload
    pub async fn game(&self, id: &str) -> Result<Value> {
        let url = format!(
            "{}/games/{}?key={}",
            self.base_url,
            urlencoding::encode(id),
            self.key()?
        );
        self.fetch(&url).await
    }

    /// Same payload as [`RawgClient::game`], typed
    pub async fn game_detail(&self, id: &str) -> Result<RawgGame> {
        Ok(serde_json::from_value(self.game(id).await?)?)
    }

    /// RAWG's own "games like this" list; often empty
    pub async fn suggested(&self, id: &str) -> Result<Vec<RawgGame>> {
        let url = format!(
            "{}/games/{}/suggested?key={}",
            self.base_url,
            urlencoding::encode(id),
            self.key()?
        );
        self.fetch_page(&url).await
    }

    /// Best-rated games in a genre
    pub async fn top_in_genre(&self, genre_slug: &str, page_size: u32) -> Result<Vec<RawgGame>> {
        let url = format!(
            "{}/games?key={}&genres={}&ordering=-rating&page_size={}",
            self.base_url,
            self.key()?,
            urlencoding::encode(genre_slug),
            page_size
        );
        self.fetch_page(&url).await
    }

    /// Generic `/games` listing; params are appended in the order given
    pub async fn browse(&self, params: &[(&str, String)]) -> Result<Vec<RawgGame>> {
        let mut url = format!("{}/games?key={}", self.base_url, self.key()?);
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        self.fetch_page(&url).await
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawgPage {
    #[serde(default)]
    results: Vec<RawgGame>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawgGame {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub released: Option<String>,
    pub background_image: Option<String>,
    pub rating: Option<f64>,
    pub description_raw: Option<String>,
    // RAWG sends `null` instead of `[]` for some titles
    pub genres: Option<Vec<RawgGenre>>,
    pub platforms: Option<Vec<RawgPlatformEntry>>,
}

impl RawgGame {
    pub fn genre_names(&self) -> Vec<String> {
        self.genres
            .iter()
            .flatten()
            .map(|g| g.name.clone())
            .collect()
    }

    pub fn platform_names(&self) -> Vec<String> {
        self.platforms
            .iter()
            .flatten()
            .filter_map(|p| p.platform.as_ref().map(|pl| pl.name.clone()))
            .collect()
    }

    pub fn primary_genre_slug(&self) -> Option<&str> {
        self.genres
            .as_ref()
            .and_then(|g| g.first())
            .map(|g| g.slug.as_str())
            .filter(|slug| !slug.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawgGenre {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawgPlatformEntry {
    pub platform: Option<RawgPlatform>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawgPlatform {
    pub name: String,
}
