// Core catalog logic - providers, normalization and the facade over them
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod providers;

pub use catalog::{route, supported_categories, Catalog};
pub use config::Config;
pub use error::Error;
pub use models::{Category, ItemSummary, Kind, KindFilter, Listing, MediaItem, Provider};
pub use providers::MediaProvider;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
