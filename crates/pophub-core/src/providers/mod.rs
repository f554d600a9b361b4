// Provider adapters - bridge the API clients with the MediaProvider trait
pub mod rawg;
pub mod spotify;
pub mod tmdb;

pub use rawg::RawgProvider;
pub use spotify::SpotifyProvider;
pub use tmdb::TmdbProvider;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    models::{Category, Kind, Listing, MediaItem, Provider},
    Error, Result,
};

/// One upstream catalog, normalized
///
/// Search and category calls on an unconfigured provider answer
/// `Listing::Disabled` without touching the network. Item and
/// recommendation calls on one fail with `Error::Unconfigured`.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    fn provider(&self) -> Provider;

    fn is_configured(&self) -> bool;

    async fn search(&self, query: &str) -> Result<Listing>;

    /// Raw upstream payload, untouched
    async fn item(&self, kind: Kind, id: &str) -> Result<Value>;

    /// Related items in partial shape (kind, id, title, cover)
    async fn recommendations(&self, kind: Kind, id: &str) -> Result<Vec<MediaItem>>;

    async fn category(&self, category: Category, kind: Kind) -> Result<Listing>;

    /// Flatten a payload returned by [`MediaProvider::item`]
    fn normalize_detail(&self, kind: Kind, raw: Value) -> Result<MediaItem>;
}

pub(crate) fn unsupported(provider: Provider, what: impl std::fmt::Display) -> Error {
    Error::UnsupportedOperation(format!("{} does not serve {}", provider, what))
}
