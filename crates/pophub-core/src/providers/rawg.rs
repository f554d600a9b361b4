// RAWG provider - games
use async_trait::async_trait;
use chrono::Utc;
use pophub_api::{RawgClient, RawgGame};
use serde_json::Value;
use tracing::debug;

use super::{unsupported, MediaProvider};
use crate::{
    discovery,
    models::{year_of, Category, ItemExtra, Kind, Listing, MediaItem, Provider},
    Result,
};

/// How many genre-fallback recommendations to ask for
const GENRE_FALLBACK_SIZE: u32 = 10;

pub struct RawgProvider {
    client: RawgClient,
}

impl RawgProvider {
    pub fn new(client: RawgClient) -> Self {
        Self { client }
    }
}

/// RAWG ratings are 0-5; everything else in the catalog is 0-10
fn game_to_item(game: RawgGame) -> MediaItem {
    let genres = game.genre_names();
    let platforms = game.platform_names();

    MediaItem {
        kind: Kind::Game,
        provider_id: game.id.to_string(),
        title: game.name,
        year: year_of(game.released.as_deref()),
        genres,
        cover_url: game.background_image.unwrap_or_default(),
        summary: game.description_raw.unwrap_or_default(),
        rating: game.rating.map(|r| r * 2.0),
        provider: Provider::Rawg,
        extra: Some(ItemExtra {
            platforms,
            creators: None,
        }),
    }
}

fn game_to_partial(game: RawgGame) -> MediaItem {
    MediaItem::partial(
        Kind::Game,
        Provider::Rawg,
        game.id.to_string(),
        game.name,
        game.background_image.unwrap_or_default(),
    )
}

fn check_kind(kind: Kind) -> Result<()> {
    if kind == Kind::Game {
        Ok(())
    } else {
        Err(unsupported(Provider::Rawg, kind))
    }
}

#[async_trait]
impl MediaProvider for RawgProvider {
    fn provider(&self) -> Provider {
        Provider::Rawg
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn search(&self, query: &str) -> Result<Listing> {
        if !self.is_configured() {
            debug!("RAWG not configured, skipping search");
            return Ok(Listing::Disabled);
        }

        let games = self.client.search(query).await?;
        Ok(Listing::from_items(games.into_iter().map(game_to_item).collect()))
    }

    async fn item(&self, kind: Kind, id: &str) -> Result<Value> {
        check_kind(kind)?;
        Ok(self.client.game(id).await?)
    }

    /// Suggested list first; if that comes back empty, the best-rated games
    /// in the item's primary genre
    async fn recommendations(&self, kind: Kind, id: &str) -> Result<Vec<MediaItem>> {
        check_kind(kind)?;

        let suggested = self.client.suggested(id).await?;
        if !suggested.is_empty() {
            return Ok(suggested.into_iter().map(game_to_partial).collect());
        }

        let game = self.client.game_detail(id).await?;
        let Some(genre) = game.primary_genre_slug() else {
            debug!("Game {} has no genres, no fallback recommendations", id);
            return Ok(Vec::new());
        };

        debug!("No suggestions for game {}, falling back to genre '{}'", id, genre);
        let similar = self.client.top_in_genre(genre, GENRE_FALLBACK_SIZE).await?;
        Ok(similar.into_iter().map(game_to_partial).collect())
    }

    async fn category(&self, category: Category, kind: Kind) -> Result<Listing> {
        check_kind(kind)?;
        let params = discovery::game_listing_params(category, Utc::now().date_naive())
            .ok_or_else(|| unsupported(Provider::Rawg, format!("{} {}", category, kind)))?;

        if !self.is_configured() {
            return Ok(Listing::Disabled);
        }

        let games = self.client.browse(&params).await?;
        Ok(Listing::from_items(games.into_iter().map(game_to_item).collect()))
    }

    fn normalize_detail(&self, kind: Kind, raw: Value) -> Result<MediaItem> {
        check_kind(kind)?;
        let game: RawgGame = serde_json::from_value(raw)?;
        Ok(game_to_item(game))
    }
}
