// The catalog facade - what the web layer actually talks to
use std::sync::Arc;

use futures::future::join_all;
use pophub_api::{
    http_client, AuthScopedKey, CredentialManager, FetchGateway, RawgClient, SpotifyClient,
    TmdbClient,
};
use pophub_cache::{CacheManager, ResponseStore};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    config::Config,
    models::{Category, ItemSummary, Kind, KindFilter, Listing, MediaItem, Provider},
    providers::{MediaProvider, RawgProvider, SpotifyProvider, TmdbProvider},
    Error, Result,
};

/// Browse categories each kind supports
pub fn supported_categories(kind: Kind) -> &'static [Category] {
    match kind {
        Kind::Movie => &[Category::Trending, Category::TopRated, Category::Latest],
        Kind::Tv => &[Category::Trending, Category::TopRated, Category::OnAir],
        Kind::Game => &[Category::Trending, Category::TopRated, Category::NewReleases],
        Kind::Album => &[Category::Trending, Category::NewReleases, Category::Featured],
    }
}

/// Which provider answers a `(category, kind)` pair, if any does
pub fn route(category: Category, kind: Kind) -> Result<Provider> {
    if supported_categories(kind).contains(&category) {
        Ok(kind.provider())
    } else {
        Err(Error::UnsupportedOperation(format!(
            "no {} listing for {}",
            category, kind
        )))
    }
}

/// Fan-out/fan-in over the three providers
///
/// Results always come back in provider order (TMDB, RAWG, Spotify) with
/// no ranking or de-duplication across providers. Share it behind an `Arc`;
/// the cache and the credential manager underneath are safe to hit from
/// concurrent requests.
pub struct Catalog {
    tmdb: Box<dyn MediaProvider>,
    rawg: Box<dyn MediaProvider>,
    spotify: Box<dyn MediaProvider>,
}

impl Catalog {
    pub fn new(
        tmdb: Box<dyn MediaProvider>,
        rawg: Box<dyn MediaProvider>,
        spotify: Box<dyn MediaProvider>,
    ) -> Self {
        Self {
            tmdb,
            rawg,
            spotify,
        }
    }

    /// Wire everything up from config, with the SQLite cache at `config.cache_path()`
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.cache_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening response cache at {}", path.display());
        let store = Arc::new(CacheManager::new(&path)?);
        Self::with_store(config, store)
    }

    /// Same as [`Catalog::from_config`] but over any response store
    pub fn with_store(config: &Config, store: Arc<dyn ResponseStore>) -> Result<Self> {
        let client = http_client()?;
        let mut gateway = FetchGateway::with_client(client.clone(), store, config.cache_ttl()?);
        if config.cache.auth_scoped_keys {
            gateway = gateway.with_key_strategy(AuthScopedKey);
        }
        let gateway = Arc::new(gateway);

        let providers = &config.providers;

        let tmdb = TmdbClient::with_base_url(
            gateway.clone(),
            providers.tmdb.api_key.clone(),
            providers.tmdb.api_url.clone(),
        );
        let rawg = RawgClient::with_base_url(
            gateway.clone(),
            providers.rawg.api_key.clone(),
            providers.rawg.api_url.clone(),
        );

        let credentials = providers.spotify.credentials().map(|(id, secret)| {
            Arc::new(CredentialManager::with_token_url(
                client,
                id,
                secret,
                providers.spotify.accounts_url.clone(),
            ))
        });
        let spotify = SpotifyClient::with_base_url(
            gateway,
            credentials,
            providers.spotify.api_url.clone(),
        );

        Ok(Self::new(
            Box::new(TmdbProvider::new(tmdb, providers.tmdb.image_base_url.clone())),
            Box::new(RawgProvider::new(rawg)),
            Box::new(SpotifyProvider::new(spotify)),
        ))
    }

    fn provider_for(&self, kind: Kind) -> &dyn MediaProvider {
        match kind.provider() {
            Provider::Tmdb => self.tmdb.as_ref(),
            Provider::Rawg => self.rawg.as_ref(),
            Provider::Spotify => self.spotify.as_ref(),
        }
    }

    /// Providers in the fixed output order
    fn providers(&self) -> [&dyn MediaProvider; 3] {
        [self.tmdb.as_ref(), self.rawg.as_ref(), self.spotify.as_ref()]
    }

    /// Per-provider outcomes, in provider order
    ///
    /// A named kind runs only that kind's provider and keeps only that kind.
    pub async fn search_outcomes(
        &self,
        query: &str,
        filter: KindFilter,
    ) -> Result<Vec<(Provider, Listing)>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        match filter {
            KindFilter::Only(kind) => {
                let provider = self.provider_for(kind);
                let listing = provider.search(query).await?.retain_kind(kind);
                Ok(vec![(provider.provider(), listing)])
            }
            KindFilter::All => {
                let providers = self.providers();
                let searches = providers.iter().map(|p| p.search(query));
                let results = join_all(searches).await;

                let mut outcomes = Vec::with_capacity(providers.len());
                for (provider, result) in providers.iter().zip(results) {
                    outcomes.push((provider.provider(), result?));
                }
                Ok(outcomes)
            }
        }
    }

    pub async fn search(&self, query: &str, filter: KindFilter) -> Result<Vec<MediaItem>> {
        let outcomes = self.search_outcomes(query, filter).await?;

        let mut items = Vec::new();
        for (provider, listing) in outcomes {
            match &listing {
                Listing::Disabled => debug!("{} skipped: not configured", provider),
                other => debug!("{} returned {} results", provider, other.len()),
            }
            items.extend(listing.into_items());
        }
        Ok(items)
    }

    /// Raw provider payload; the caller layers local ratings on top
    pub async fn item_detail(&self, kind: Kind, provider_id: &str) -> Result<Value> {
        self.provider_for(kind).item(kind, provider_id).await
    }

    pub async fn recommendations(&self, kind: Kind, provider_id: &str) -> Result<Vec<MediaItem>> {
        self.provider_for(kind)
            .recommendations(kind, provider_id)
            .await
    }

    /// Tagged category outcome; unsupported pairs are rejected up front
    pub async fn category_listing(&self, category: Category, kind: Kind) -> Result<Listing> {
        route(category, kind)?;
        self.provider_for(kind).category(category, kind).await
    }

    pub async fn category(&self, category: Category, kind: Kind) -> Result<Vec<MediaItem>> {
        Ok(self.category_listing(category, kind).await?.into_items())
    }

    /// Title/year/cover card for a saved item
    pub async fn item_summary(&self, kind: Kind, provider_id: &str) -> Result<ItemSummary> {
        let provider = self.provider_for(kind);
        let raw = provider.item(kind, provider_id).await?;
        let item = provider.normalize_detail(kind, raw)?;
        Ok(ItemSummary::from(item))
    }
}
