use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// What sort of thing an item is - the main discriminator everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Movie,
    Tv,
    Game,
    Album,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Movie, Kind::Tv, Kind::Game, Kind::Album];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Movie => "movie",
            Kind::Tv => "tv",
            Kind::Game => "game",
            Kind::Album => "album",
        }
    }

    /// The one upstream that serves this kind
    pub fn provider(&self) -> Provider {
        match self {
            Kind::Movie | Kind::Tv => Provider::Tmdb,
            Kind::Game => Provider::Rawg,
            Kind::Album => Provider::Spotify,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Kind::Movie),
            "tv" => Ok(Kind::Tv),
            "game" => Ok(Kind::Game),
            "album" => Ok(Kind::Album),
            other => Err(Error::UnsupportedOperation(format!("unknown kind '{}'", other))),
        }
    }
}

/// Which upstream an item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Tmdb,
    Rawg,
    Spotify,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Tmdb => write!(f, "tmdb"),
            Provider::Rawg => write!(f, "rawg"),
            Provider::Spotify => write!(f, "spotify"),
        }
    }
}

/// Search scope: everything, or a single kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(Kind),
}

impl FromStr for KindFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(KindFilter::All),
            other => other.parse().map(KindFilter::Only),
        }
    }
}

/// Browse categories. Not every category exists for every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Trending,
    TopRated,
    Latest,
    OnAir,
    NewReleases,
    Featured,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Trending => "trending",
            Category::TopRated => "top-rated",
            Category::Latest => "latest",
            Category::OnAir => "on-air",
            Category::NewReleases => "new-releases",
            Category::Featured => "featured",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(Category::Trending),
            "top-rated" => Ok(Category::TopRated),
            "latest" => Ok(Category::Latest),
            "on-air" => Ok(Category::OnAir),
            "new-releases" => Ok(Category::NewReleases),
            "featured" => Ok(Category::Featured),
            other => Err(Error::UnsupportedOperation(format!(
                "unknown category '{}'",
                other
            ))),
        }
    }
}

/// Adapter-specific bits nobody is required to look at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemExtra {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creators: Option<String>,
}

/// The one item shape every provider gets flattened into
///
/// Which fields carry data depends on `kind` and `provider`; empty strings
/// and empty lists mean "the provider didn't say".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: Kind,
    pub provider_id: String,
    pub title: String,
    /// Four digits, or empty
    pub year: String,
    pub genres: Vec<String>,
    pub cover_url: String,
    pub summary: String,
    /// Provider score on a 0-10 scale, unrelated to local user ratings
    pub rating: Option<f64>,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ItemExtra>,
}

impl MediaItem {
    /// Bare item with only the identity fields set. Recommendations stop here.
    pub fn partial(
        kind: Kind,
        provider: Provider,
        provider_id: impl Into<String>,
        title: impl Into<String>,
        cover_url: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider_id: provider_id.into(),
            title: title.into(),
            year: String::new(),
            genres: Vec::new(),
            cover_url: cover_url.into(),
            summary: String::new(),
            rating: None,
            provider,
            extra: None,
        }
    }
}

/// Card-sized view of an item, for saved-list pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub kind: Kind,
    pub provider_id: String,
    pub title: String,
    pub year: String,
    pub cover_url: String,
}

impl From<MediaItem> for ItemSummary {
    fn from(item: MediaItem) -> Self {
        Self {
            kind: item.kind,
            provider_id: item.provider_id,
            title: item.title,
            year: item.year,
            cover_url: item.cover_url,
        }
    }
}

/// Outcome of a search or category call, before it gets flattened
///
/// Callers outside the core only ever see `into_items()`, but keeping the
/// tag around lets us tell "provider off" from "nothing found" from
/// "made up from seed searches".
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// Provider has no credentials; nothing was requested
    Disabled,
    /// Provider answered with nothing
    Empty,
    Items(Vec<MediaItem>),
    /// Approximated from searches, not a real upstream listing
    Heuristic(Vec<MediaItem>),
}

impl Listing {
    pub fn from_items(items: Vec<MediaItem>) -> Self {
        if items.is_empty() {
            Listing::Empty
        } else {
            Listing::Items(items)
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        match self {
            Listing::Disabled | Listing::Empty => &[],
            Listing::Items(items) | Listing::Heuristic(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<MediaItem> {
        match self {
            Listing::Disabled | Listing::Empty => Vec::new(),
            Listing::Items(items) | Listing::Heuristic(items) => items,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Listing::Disabled)
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, Listing::Heuristic(_))
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Drop items of other kinds, keeping the tag
    pub fn retain_kind(self, kind: Kind) -> Self {
        match self {
            Listing::Items(items) => {
                Listing::from_items(items.into_iter().filter(|i| i.kind == kind).collect())
            }
            Listing::Heuristic(items) => {
                Listing::Heuristic(items.into_iter().filter(|i| i.kind == kind).collect())
            }
            other => other,
        }
    }
}

/// First four characters of a date string, if they look like a year
pub fn year_of(date: Option<&str>) -> String {
    match date {
        Some(d) if d.len() >= 4 && d.as_bytes()[..4].iter().all(u8::is_ascii_digit) => {
            d[..4].to_string()
        }
        _ => String::new(),
    }
}
