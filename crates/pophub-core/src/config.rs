use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Loaded from the config file, then overridden by env vars.
/// Priority: Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub providers: ProviderConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from the default location, then apply env overrides
    pub fn load() -> crate::Result<Self> {
        let mut config = Self::load_file(&Self::config_path()?)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// File contents over defaults, no env. A missing file is all defaults.
    pub fn load_file(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Write a default config file unless one already exists
    ///
    /// Returns the path and whether a file was written. Credentials are
    /// never written: they stay in the environment or get added by hand.
    pub fn init() -> crate::Result<(PathBuf, bool)> {
        let path = Self::config_path()?;
        let written = Self::init_at(&path)?;
        Ok((path, written))
    }

    pub fn init_at(path: &Path) -> crate::Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(&Self::default())
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(true)
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` in
    /// real use; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("TMDB_API_KEY") {
            self.providers.tmdb.api_key = Some(key);
        }
        if let Some(key) = non_empty("RAWG_API_KEY") {
            self.providers.rawg.api_key = Some(key);
        }
        if let Some(id) = non_empty("SPOTIFY_CLIENT_ID") {
            self.providers.spotify.client_id = Some(id);
        }
        if let Some(secret) = non_empty("SPOTIFY_CLIENT_SECRET") {
            self.providers.spotify.client_secret = Some(secret);
        }
        if let Some(ttl) = non_empty("POPHUB_CACHE_TTL_SECONDS") {
            match ttl.parse() {
                Ok(secs) => self.cache.ttl_seconds = secs,
                Err(_) => tracing::warn!("Ignoring bad POPHUB_CACHE_TTL_SECONDS: {}", ttl),
            }
        }
    }

    /// `{config_dir}/pophub/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("pophub");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the response cache lives unless `cache.path` says otherwise
    pub fn cache_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.cache.path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("pophub");

        Ok(data_dir.join("cache.db"))
    }

    /// `cache.ttl_seconds` as a duration; values chrono can't hold are rejected
    pub fn cache_ttl(&self) -> crate::Result<chrono::Duration> {
        let secs = self.cache.ttl_seconds;
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                crate::Error::ConfigError(format!("cache.ttl_seconds out of range: {}", secs))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    pub tmdb: TmdbConfig,
    pub rawg: RawgConfig,
    pub spotify: SpotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// Get one at https://www.themoviedb.org/settings/api
    pub api_key: Option<String>,

    #[serde(default = "default_tmdb_url")]
    pub api_url: String,

    /// Poster paths get appended to this
    #[serde(default = "default_tmdb_image_url")]
    pub image_base_url: String,
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_tmdb_url(),
            image_base_url: default_tmdb_image_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawgConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_rawg_url")]
    pub api_url: String,
}

fn default_rawg_url() -> String {
    "https://api.rawg.io/api".to_string()
}

impl Default for RawgConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_rawg_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    #[serde(default = "default_spotify_url")]
    pub api_url: String,

    /// Client-credentials token endpoint
    #[serde(default = "default_spotify_accounts_url")]
    pub accounts_url: String,
}

impl SpotifyConfig {
    /// Both halves of the client credentials, or nothing
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

fn default_spotify_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_url: default_spotify_url(),
            accounts_url: default_spotify_accounts_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached response stays fresh
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,

    /// SQLite file; defaults to the user data dir
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Key entries on URL + Authorization digest instead of URL alone
    #[serde(default)]
    pub auth_scoped_keys: bool,
}

fn default_cache_ttl() -> u64 {
    6 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            path: None,
            auth_scoped_keys: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_seconds, 21600);
        assert_eq!(config.cache_ttl().unwrap(), chrono::Duration::hours(6));
        assert!(config.providers.tmdb.api_key.is_none());
        assert_eq!(
            config.providers.tmdb.image_base_url,
            "https://image.tmdb.org/t/p/w500"
        );
        assert!(config.providers.spotify.credentials().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [providers.rawg]
            api_key = "rawg-key"

            [cache]
            ttl_seconds = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.providers.rawg.api_key.as_deref(), Some("rawg-key"));
        assert_eq!(config.providers.rawg.api_url, "https://api.rawg.io/api");
        assert_eq!(config.cache.ttl_seconds, 60);
        assert!(!config.cache.auth_scoped_keys);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml_str("[cache\nttl_seconds = ").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml_str(
            r#"
            [providers.tmdb]
            api_key = "from-file"
            "#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("TMDB_API_KEY", "from-env"),
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("RAWG_API_KEY", ""),
            ("POPHUB_CACHE_TTL_SECONDS", "120"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.providers.tmdb.api_key.as_deref(), Some("from-env"));
        // empty env values don't count
        assert!(config.providers.rawg.api_key.is_none());
        assert_eq!(
            config.providers.spotify.credentials(),
            Some(("id".to_string(), "secret".to_string()))
        );
        assert_eq!(config.cache.ttl_seconds, 120);
    }

    #[test]
    fn test_oversized_ttl_is_config_error() {
        for ttl in ["10000000000000000", "18446744073709551615"] {
            let mut config = Config::default();
            config.apply_env(|name| (name == "POPHUB_CACHE_TTL_SECONDS").then(|| ttl.to_string()));

            let err = config.cache_ttl().unwrap_err();
            assert!(matches!(err, crate::Error::ConfigError(_)), "{}: {:?}", ttl, err);
        }

        let mut config = Config::default();
        config.cache.ttl_seconds = 1;
        assert_eq!(config.cache_ttl().unwrap(), chrono::Duration::seconds(1));
    }

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pophub").join("config.toml");

        assert!(Config::init_at(&path).unwrap());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("ttl_seconds"));
        assert!(!written.contains("api_key"));
        assert!(!written.contains("client_secret"));

        std::fs::write(&path, "[providers.tmdb]\napi_key = \"mine\"\n").unwrap();
        assert!(!Config::init_at(&path).unwrap());

        let kept = Config::load_file(&path).unwrap();
        assert_eq!(kept.providers.tmdb.api_key.as_deref(), Some("mine"));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.cache.ttl_seconds, 21600);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("ttl_seconds"));
        assert!(toml.contains("image_base_url"));
    }
}
