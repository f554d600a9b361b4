// SQLite-backed response cache
// Keeps provider calls down and keeps us under their rate limits

pub mod cache;

pub use cache::{CacheEntry, CacheError, CacheManager, ResponseStore, Result};
