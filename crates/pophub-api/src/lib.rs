// API clients for the upstream catalogs, plus the cached fetch path they share
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod rawg;
pub mod spotify;
pub mod tmdb;

// Re-export common types
pub use credentials::{Credential, CredentialManager};
pub use error::{ApiError, Result};
pub use gateway::{
    http_client, redact, AuthScopedKey, CacheKeyStrategy, FetchGateway, UrlKey, HTTP_TIMEOUT,
};
pub use rawg::{RawgClient, RawgGame};
pub use spotify::{SpotifyAlbum, SpotifyClient};
pub use tmdb::{TmdbClient, TmdbMedia, TmdbResult};
