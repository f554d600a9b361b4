// TMDB provider - movies and TV out of one multi-search endpoint
use async_trait::async_trait;
use pophub_api::{TmdbClient, TmdbMedia, TmdbResult};
use serde_json::Value;
use tracing::debug;

use super::{unsupported, MediaProvider};
use crate::{
    models::{year_of, Category, Kind, Listing, MediaItem, Provider},
    Result,
};

/// `media_type` value TMDB uses for shows
const TV_MARKER: &str = "tv";

pub struct TmdbProvider {
    client: TmdbClient,
    image_base_url: String,
}

impl TmdbProvider {
    pub fn new(client: TmdbClient, image_base_url: String) -> Self {
        Self {
            client,
            image_base_url,
        }
    }

    fn cover(&self, poster_path: Option<&str>) -> String {
        match poster_path {
            Some(p) if !p.is_empty() => format!("{}{}", self.image_base_url, p),
            _ => String::new(),
        }
    }

    fn to_item(&self, r: TmdbResult, kind: Kind) -> MediaItem {
        let (title, date) = match kind {
            Kind::Tv => (
                r.name.or(r.title),
                r.first_air_date.or(r.release_date),
            ),
            _ => (
                r.title.or(r.name),
                r.release_date.or(r.first_air_date),
            ),
        };

        MediaItem {
            kind,
            provider_id: r.id.to_string(),
            title: title.unwrap_or_default(),
            year: year_of(date.as_deref()),
            genres: r.genres.into_iter().map(|g| g.name).collect(),
            cover_url: self.cover(r.poster_path.as_deref()),
            summary: r.overview.unwrap_or_default(),
            rating: r.vote_average,
            provider: Provider::Tmdb,
            extra: None,
        }
    }

    fn to_partial(&self, r: TmdbResult, kind: Kind) -> MediaItem {
        let title = match kind {
            Kind::Tv => r.name.or(r.title),
            _ => r.title.or(r.name),
        };
        MediaItem::partial(
            kind,
            Provider::Tmdb,
            r.id.to_string(),
            title.unwrap_or_default(),
            self.cover(r.poster_path.as_deref()),
        )
    }

    fn to_listing(&self, results: Vec<TmdbResult>, kind: Kind) -> Listing {
        Listing::from_items(results.into_iter().map(|r| self.to_item(r, kind)).collect())
    }
}

/// Only the TV marker means TV; anything else, or nothing, is a movie
pub fn kind_for_media_type(media_type: Option<&str>) -> Kind {
    if media_type == Some(TV_MARKER) {
        Kind::Tv
    } else {
        Kind::Movie
    }
}

fn media_for(kind: Kind) -> Option<TmdbMedia> {
    match kind {
        Kind::Movie => Some(TmdbMedia::Movie),
        Kind::Tv => Some(TmdbMedia::Tv),
        _ => None,
    }
}

#[async_trait]
impl MediaProvider for TmdbProvider {
    fn provider(&self) -> Provider {
        Provider::Tmdb
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn search(&self, query: &str) -> Result<Listing> {
        if !self.is_configured() {
            debug!("TMDB not configured, skipping search");
            return Ok(Listing::Disabled);
        }

        let results = self.client.search_multi(query).await?;
        let items = results
            .into_iter()
            .map(|r| {
                let kind = kind_for_media_type(r.media_type.as_deref());
                self.to_item(r, kind)
            })
            .filter(|item| !item.title.is_empty())
            .collect();

        Ok(Listing::from_items(items))
    }

    async fn item(&self, kind: Kind, id: &str) -> Result<Value> {
        let media = media_for(kind).ok_or_else(|| unsupported(Provider::Tmdb, kind))?;
        Ok(self.client.details(media, id).await?)
    }

    async fn recommendations(&self, kind: Kind, id: &str) -> Result<Vec<MediaItem>> {
        let media = media_for(kind).ok_or_else(|| unsupported(Provider::Tmdb, kind))?;
        let similar = self.client.similar(media, id).await?;
        Ok(similar.into_iter().map(|r| self.to_partial(r, kind)).collect())
    }

    async fn category(&self, category: Category, kind: Kind) -> Result<Listing> {
        // reject bad pairs before looking at configuration
        let is_supported = matches!(
            (category, kind),
            (Category::Trending | Category::TopRated | Category::Latest, Kind::Movie)
                | (Category::Trending | Category::TopRated | Category::OnAir, Kind::Tv)
        );
        if !is_supported {
            return Err(unsupported(Provider::Tmdb, format!("{} {}", category, kind)));
        }

        if !self.is_configured() {
            return Ok(Listing::Disabled);
        }

        let results = match (category, kind) {
            (Category::Trending, Kind::Movie) => self.client.trending(TmdbMedia::Movie).await?,
            (Category::TopRated, Kind::Movie) => self.client.top_rated(TmdbMedia::Movie).await?,
            (Category::Latest, Kind::Movie) => self.client.now_playing().await?,
            (Category::Trending, Kind::Tv) => self.client.trending(TmdbMedia::Tv).await?,
            (Category::TopRated, Kind::Tv) => self.client.top_rated(TmdbMedia::Tv).await?,
            (Category::OnAir, Kind::Tv) => self.client.on_the_air().await?,
            _ => return Err(unsupported(Provider::Tmdb, format!("{} {}", category, kind))),
        };

        // listings are per media family, so the requested kind wins over media_type
        Ok(self.to_listing(results, kind))
    }

    fn normalize_detail(&self, kind: Kind, raw: Value) -> Result<MediaItem> {
        media_for(kind).ok_or_else(|| unsupported(Provider::Tmdb, kind))?;
        let result: TmdbResult = serde_json::from_value(raw)?;
        Ok(self.to_item(result, kind))
    }
}
