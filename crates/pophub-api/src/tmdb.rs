// TMDB (movies + TV) API client
use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::gateway::FetchGateway;

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

/// The two TMDB media families we care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmdbMedia {
    Movie,
    Tv,
}

impl TmdbMedia {
    pub fn path(&self) -> &'static str {
        match self {
            TmdbMedia::Movie => "movie",
            TmdbMedia::Tv => "tv",
        }
    }
}

pub struct TmdbClient {
    gateway: Arc<FetchGateway>,
    api_key: Option<String>,
    base_url: String,
}

impl TmdbClient {
    pub fn new(gateway: Arc<FetchGateway>, api_key: Option<String>) -> Self {
        Self::with_base_url(gateway, api_key, TMDB_API_BASE.to_string())
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
        self.api_key.as_deref().ok_or(ApiError::Unconfigured("TMDB"))
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        self.gateway.fetch_cached(url, HeaderMap::new()).await
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<TmdbResult>> {
        let page: TmdbPage = serde_json::from_value(self.fetch(url).await?)?;
        Ok(page.results)
    }

    /// Multi-search: movies, TV and people mixed in one list
    pub async fn search_multi(&self, query: &str) -> Result<Vec<TmdbResult>> {
        let url = format!(
            "{}/search/multi?api_key={}&query={}",
            self.base_url,
            self.key()?,
            urlencoding::encode(query)
        );
        self.fetch_page(&url).await
    }

    /// Raw detail payload, with videos and similar titles appended
    pub async fn details(&self, media: TmdbMedia, id: &str) -> Result<Value> {
        let url = format!(
            "{}/{}/{}?api_key={}&append_to_response=videos,similar",
            self.base_url,
            media.path(),
            urlencoding::encode(id),
            self.key()?
        );
        self.fetch(&url).await
    }

    /// The "similar" list embedded in the detail payload
    pub async fn similar(&self, media: TmdbMedia, id: &str) -> Result<Vec<TmdbResult>> {
        let detail: TmdbDetail = serde_json::from_value(self.details(media, id).await?)?;
        Ok(detail.similar.map(|page| page.results).unwrap_or_default())
    }

    /// Weekly trending for one media family
    pub async fn trending(&self, media: TmdbMedia) -> Result<Vec<TmdbResult>> {
        let url = format!(
            "{}/trending/{}/week?api_key={}",
            self.base_url,
            media.path(),
            self.key()?
        );
        self.fetch_page(&url).await
    }

    pub async fn top_rated(&self, media: TmdbMedia) -> Result<Vec<TmdbResult>> {
        let url = format!(
            "{}/{}/top_rated?api_key={}",
            self.base_url,
            media.path(),
            self.key()?
        );
        self.fetch_page(&url).await
    }

    /// Movies currently in theaters
    pub async fn now_playing(&self) -> Result<Vec<TmdbResult>> {
        let url = format!("{}/movie/now_playing?api_key={}", self.base_url, self.key()?);
        self.fetch_page(&url).await
    }

    /// TV shows with an episode airing in the next week
    pub async fn on_the_air(&self) -> Result<Vec<TmdbResult>> {
        let url = format!("{}/tv/on_the_air?api_key={}", self.base_url, self.key()?);
        self.fetch_page(&url).await
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbPage {
    #[serde(default)]
    results: Vec<TmdbResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct TmdbDetail {
    similar: Option<TmdbPage>,
}

/// One entry of any TMDB result list (or a detail payload)
///
/// Movies use `title`/`release_date`, TV uses `name`/`first_air_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbResult {
    pub id: u64,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}
