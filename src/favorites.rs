//! Saved locations for quick switching between searches.
//!
//! The list serializes as a plain JSON array so callers can persist it as-is.

use crate::aggregator::SearchQuery;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FavoriteError {
    #[error("This location is already in your favorites")]
    AlreadyFavorited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub city: String,
    /// Empty when the search had no country.
    #[serde(default)]
    pub country: String,
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    fn is(&self, city: &str, country: &str) -> bool {
        self.city == city && self.country == country
    }

    /// Search parameters that reload this location.
    pub fn query(&self) -> Option<SearchQuery> {
        SearchQuery::new(&self.city, Some(&self.country))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    entries: Vec<Favorite>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the searched location. Matching is exact on city and country.
    pub fn add(&mut self, query: &SearchQuery) -> Result<&Favorite, FavoriteError> {
        let country = query.country.clone().unwrap_or_default();
        if self.entries.iter().any(|f| f.is(&query.city, &country)) {
            return Err(FavoriteError::AlreadyFavorited);
        }

        self.entries.push(Favorite {
            city: query.city.clone(),
            country,
            added_at: Utc::now(),
        });
        tracing::debug!("Added {} to favorites", query.city);

        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, city: &str, country: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|f| !f.is(city, country));
        self.entries.len() != before
    }

    pub fn contains(&self, query: &SearchQuery) -> bool {
        let country = query.country.as_deref().unwrap_or_default();
        self.entries.iter().any(|f| f.is(&query.city, country))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Favorite> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(city: &str, country: Option<&str>) -> SearchQuery {
        SearchQuery::new(city, country).unwrap()
    }

    #[test]
    fn test_duplicate_location_is_rejected() {
        let mut favorites = Favorites::new();

        let added = favorites.add(&query("Lisbon", Some("PT"))).unwrap();
        assert_eq!(added.city, "Lisbon");
        assert_eq!(added.country, "PT");

        assert_eq!(
            favorites.add(&query(" Lisbon ", Some("PT"))),
            Err(FavoriteError::AlreadyFavorited)
        );
        favorites.add(&query("Lisbon", None)).unwrap();
        favorites.add(&query("Porto", Some("PT"))).unwrap();

        assert_eq!(favorites.len(), 3);
        assert!(favorites.contains(&query("Lisbon", None)));
        assert!(!favorites.contains(&query("lisbon", Some("PT"))));
    }

    #[test]
    fn test_remove_matches_city_and_country() {
        let mut favorites = Favorites::new();
        favorites.add(&query("Lisbon", Some("PT"))).unwrap();
        favorites.add(&query("Lisbon", None)).unwrap();

        assert!(favorites.remove("Lisbon", "PT"));
        assert!(!favorites.remove("Lisbon", "PT"));
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites.iter().next().unwrap().country, "");

        assert!(favorites.remove("Lisbon", ""));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_favorites_persist_as_json_array() {
        let mut favorites = Favorites::new();
        favorites.add(&query("Nairobi", Some("KE"))).unwrap();

        let json = serde_json::to_value(&favorites).unwrap();
        assert_eq!(json[0]["city"], "Nairobi");
        assert_eq!(json[0]["country"], "KE");
        assert!(json[0]["addedAt"].is_string());

        let restored: Favorites = serde_json::from_value(json).unwrap();
        assert_eq!(restored, favorites);

        let reload = restored.iter().next().unwrap().query().unwrap();
        assert_eq!(reload, query("Nairobi", Some("KE")));
    }
}
