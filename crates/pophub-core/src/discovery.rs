// Query recipes for the browse categories
use chrono::{Duration, NaiveDate};

use crate::models::Category;

/// Max albums taken from each seed artist's search
pub const ALBUMS_PER_SEED: u32 = 4;

/// Page size for game category listings
pub const GAME_PAGE_SIZE: u32 = 20;

/// Seed artists behind the album "categories"
///
/// Spotify's client-credentials API has nothing we can use as trending,
/// new or featured album lists, so these are approximated by searching a
/// fixed set of well-known artists and concatenating a few albums from
/// each. The output is a stand-in and is reported as
/// `Listing::Heuristic`. Categories without a seed list get `&[]`.
pub fn seed_artists(category: Category) -> &'static [&'static str] {
    match category {
        Category::Trending => &[
            "Taylor Swift",
            "Drake",
            "The Weeknd",
            "Bad Bunny",
            "Billie Eilish",
        ],
        Category::NewReleases => &[
            "Sabrina Carpenter",
            "Olivia Rodrigo",
            "Kendrick Lamar",
            "SZA",
            "Dua Lipa",
        ],
        Category::Featured => &[
            "The Beatles",
            "Radiohead",
            "Fleetwood Mac",
            "Daft Punk",
            "Nirvana",
        ],
        _ => &[],
    }
}

/// RAWG `/games` parameters for a game category, relative to `today`
pub fn game_listing_params(
    category: Category,
    today: NaiveDate,
) -> Option<Vec<(&'static str, String)>> {
    let mut params = match category {
        Category::Trending => vec![
            ("dates", date_range(today - Duration::days(365), today)),
            ("ordering", "-added".to_string()),
        ],
        Category::TopRated => vec![
            ("ordering", "-rating".to_string()),
            ("metacritic", "80,100".to_string()),
        ],
        Category::NewReleases => vec![
            ("dates", date_range(today - Duration::days(30), today)),
            ("ordering", "-released".to_string()),
        ],
        _ => return None,
    };

    params.push(("page_size", GAME_PAGE_SIZE.to_string()));
    Some(params)
}

/// RAWG wants `from,to` with ISO dates
fn date_range(from: NaiveDate, to: NaiveDate) -> String {
    format!("{},{}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_categories_have_seeds() {
        for category in [Category::Trending, Category::NewReleases, Category::Featured] {
            assert!(!seed_artists(category).is_empty());
        }
        assert!(seed_artists(Category::OnAir).is_empty());
    }

    #[test]
    fn test_new_releases_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let params = game_listing_params(Category::NewReleases, today).unwrap();

        assert_eq!(params[0], ("dates", "2024-02-14,2024-03-15".to_string()));
        assert_eq!(params[1], ("ordering", "-released".to_string()));
        assert_eq!(params[2], ("page_size", "20".to_string()));
    }

    #[test]
    fn test_top_rated_has_no_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let params = game_listing_params(Category::TopRated, today).unwrap();

        assert!(params.iter().all(|(name, _)| *name != "dates"));
        assert!(params.contains(&("metacritic", "80,100".to_string())));
    }

    #[test]
    fn test_unsupported_game_category() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(game_listing_params(Category::Featured, today).is_none());
        assert!(game_listing_params(Category::OnAir, today).is_none());
    }
}
