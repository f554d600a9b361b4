// Spotify provider - albums only
use async_trait::async_trait;
use pophub_api::{SpotifyAlbum, SpotifyClient};
use serde_json::Value;
use tracing::debug;

use super::{unsupported, MediaProvider};
use crate::{
    discovery::{self, ALBUMS_PER_SEED},
    models::{year_of, Category, ItemExtra, Kind, Listing, MediaItem, Provider},
    Result,
};

const SEARCH_LIMIT: u32 = 10;
const ARTIST_ALBUM_LIMIT: u32 = 10;

pub struct SpotifyProvider {
    client: SpotifyClient,
}

impl SpotifyProvider {
    pub fn new(client: SpotifyClient) -> Self {
        Self { client }
    }
}

fn album_to_item(album: SpotifyAlbum) -> MediaItem {
    let creators = album.artist_names();
    let cover_url = album.cover_url();

    MediaItem {
        kind: Kind::Album,
        provider_id: album.id,
        title: album.name,
        year: year_of(album.release_date.as_deref()),
        genres: album.genres,
        cover_url,
        summary: String::new(),
        rating: album.popularity.map(|p| f64::from(p) / 10.0),
        provider: Provider::Spotify,
        extra: Some(ItemExtra {
            platforms: Vec::new(),
            creators: (!creators.is_empty()).then(|| creators.join(", ")),
        }),
    }
}

fn album_to_partial(album: SpotifyAlbum) -> MediaItem {
    let cover_url = album.cover_url();
    MediaItem::partial(Kind::Album, Provider::Spotify, album.id, album.name, cover_url)
}

fn check_kind(kind: Kind) -> Result<()> {
    if kind == Kind::Album {
        Ok(())
    } else {
        Err(unsupported(Provider::Spotify, kind))
    }
}

#[async_trait]
impl MediaProvider for SpotifyProvider {
    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    async fn search(&self, query: &str) -> Result<Listing> {
        if !self.is_configured() {
            debug!("Spotify not configured, skipping search");
            return Ok(Listing::Disabled);
        }

        let albums = self.client.search_albums(query, SEARCH_LIMIT).await?;
        Ok(Listing::from_items(albums.into_iter().map(album_to_item).collect()))
    }

    async fn item(&self, kind: Kind, id: &str) -> Result<Value> {
        check_kind(kind)?;
        Ok(self.client.album(id).await?)
    }

    /// Other albums by the album's first credited artist
    async fn recommendations(&self, kind: Kind, id: &str) -> Result<Vec<MediaItem>> {
        check_kind(kind)?;

        let album = self.client.album_detail(id).await?;
        let Some(artist) = album.artists.first().filter(|a| !a.id.is_empty()) else {
            return Ok(Vec::new());
        };

        let albums = self
            .client
            .artist_albums(&artist.id, ARTIST_ALBUM_LIMIT)
            .await?;
        Ok(albums.into_iter().map(album_to_partial).collect())
    }

    /// Approximated from seed-artist searches; see [`discovery::seed_artists`]
    async fn category(&self, category: Category, kind: Kind) -> Result<Listing> {
        check_kind(kind)?;
        let seeds = discovery::seed_artists(category);
        if seeds.is_empty() {
            return Err(unsupported(Provider::Spotify, format!("{} {}", category, kind)));
        }

        if !self.is_configured() {
            return Ok(Listing::Disabled);
        }

        debug!("Building heuristic {} album listing from {} seed artists", category, seeds.len());
        let mut items = Vec::new();
        for artist in seeds {
            let albums = self.client.search_albums(artist, ALBUMS_PER_SEED).await?;
            items.extend(
                albums
                    .into_iter()
                    .take(ALBUMS_PER_SEED as usize)
                    .map(album_to_item),
            );
        }

        Ok(Listing::Heuristic(items))
    }

    fn normalize_detail(&self, kind: Kind, raw: Value) -> Result<MediaItem> {
        check_kind(kind)?;
        let album: SpotifyAlbum = serde_json::from_value(raw)?;
        Ok(album_to_item(album))
    }
}
