//! Client-side aggregation of the three hub endpoints.
//!
//! A search issues the weather, city and image calls concurrently and keeps
//! each outcome separately. Only the weather result is required; city and
//! image failures are recorded and the search still succeeds.

use crate::models::{CityResult, ImageResult, WeatherResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";

/// Failure of one endpoint call, carrying the message to show the user.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FetchError {
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Please enter a city name")]
    MissingCity,
    #[error("Unable to fetch weather data. Please check the city name and try again.")]
    WeatherUnavailable(#[source] FetchError),
    #[error("No previous search to retry")]
    NothingToRetry,
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub city: String,
    pub country: Option<String>,
}

impl SearchQuery {
    /// Trims both fields; returns `None` for a blank city.
    pub fn new(city: &str, country: Option<&str>) -> Option<Self> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }
        let country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Some(Self {
            city: city.to_string(),
            country,
        })
    }

    fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("city", self.city.as_str())];
        if let Some(country) = &self.country {
            params.push(("country", country.as_str()));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularCity {
    pub name: &'static str,
    pub country: &'static str,
    pub label: &'static str,
}

impl PopularCity {
    const fn new(name: &'static str, country: &'static str, label: &'static str) -> Self {
        Self {
            name,
            country,
            label,
        }
    }

    pub fn query(&self) -> Option<SearchQuery> {
        SearchQuery::new(self.name, Some(self.country))
    }
}

pub const POPULAR_CITIES: [PopularCity; 8] = [
    PopularCity::new("London", "GB", "London, United Kingdom"),
    PopularCity::new("New York", "US", "New York, United States"),
    PopularCity::new("Tokyo", "JP", "Tokyo, Japan"),
    PopularCity::new("Paris", "FR", "Paris, France"),
    PopularCity::new("Sydney", "AU", "Sydney, Australia"),
    PopularCity::new("Berlin", "DE", "Berlin, Germany"),
    PopularCity::new("Mumbai", "IN", "Mumbai, India"),
    PopularCity::new("São Paulo", "BR", "São Paulo, Brazil"),
];

const MIN_SUGGEST_CHARS: usize = 2;
const MAX_SUGGESTIONS: usize = 5;

/// Popular cities whose name contains the input, case-insensitively.
/// Inputs shorter than two characters suggest nothing.
pub fn suggest_cities(input: &str) -> Vec<PopularCity> {
    matching_cities(&POPULAR_CITIES, input)
}

fn matching_cities(cities: &[PopularCity], input: &str) -> Vec<PopularCity> {
    let needle = input.trim().to_lowercase();
    if needle.chars().count() < MIN_SUGGEST_CHARS {
        return Vec::new();
    }
    cities
        .iter()
        .filter(|city| city.name.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .copied()
        .collect()
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub query: SearchQuery,
    pub weather: WeatherResult,
    pub city: Option<CityResult>,
    pub image: Option<ImageResult>,
    pub city_error: Option<FetchError>,
    pub image_error: Option<FetchError>,
}

pub struct HubClient {
    client: Client,
    base_url: String,
    last_search: Mutex<Option<SearchQuery>>,
}

impl HubClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AggregateError> {
        let client = Client::builder()
            .user_agent("CityInfoHub-Client/1.0")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            last_search: Mutex::new(None),
        })
    }

    pub async fn fetch_weather(&self, query: &SearchQuery) -> Result<WeatherResult, FetchError> {
        self.fetch("weather", query, "Failed to fetch weather data").await
    }

    pub async fn fetch_city(&self, query: &SearchQuery) -> Result<CityResult, FetchError> {
        self.fetch("city", query, "Failed to fetch city data").await
    }

    pub async fn fetch_image(&self, query: &SearchQuery) -> Result<ImageResult, FetchError> {
        self.fetch("image", query, "Failed to fetch image data").await
    }

    /// Runs a search and remembers its parameters for [`HubClient::retry`].
    pub async fn search(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<SearchResults, AggregateError> {
        let query = SearchQuery::new(city, country).ok_or(AggregateError::MissingCity)?;
        *self.last_search.lock().await = Some(query.clone());
        self.run(query).await
    }

    /// Replays the last search parameters.
    pub async fn retry(&self) -> Result<SearchResults, AggregateError> {
        let query = self
            .last_search
            .lock()
            .await
            .clone()
            .ok_or(AggregateError::NothingToRetry)?;
        self.run(query).await
    }

    pub async fn last_search(&self) -> Option<SearchQuery> {
        self.last_search.lock().await.clone()
    }

    async fn run(&self, query: SearchQuery) -> Result<SearchResults, AggregateError> {
        match &query.country {
            Some(country) => tracing::info!("Searching for: {}, {}", query.city, country),
            None => tracing::info!("Searching for: {}", query.city),
        }

        let (weather, city, image) = tokio::join!(
            self.fetch_weather(&query),
            self.fetch_city(&query),
            self.fetch_image(&query),
        );

        let weather = weather.map_err(|e| {
            tracing::error!("Search failed: {}", e);
            AggregateError::WeatherUnavailable(e)
        })?;

        let (city, city_error) = split(city);
        let (image, image_error) = split(image);
        if let Some(e) = &city_error {
            tracing::warn!("City data unavailable: {}", e);
        }
        if let Some(e) = &image_error {
            tracing::warn!("Image unavailable: {}", e);
        }

        Ok(SearchResults {
            query,
            weather,
            city,
            image,
            city_error,
            image_error,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &SearchQuery,
        fallback: &str,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let transport = |e: reqwest::Error| FetchError {
            status: None,
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .query(&query.params())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| fallback.to_string());
            return Err(FetchError {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json::<T>().await.map_err(transport)
    }
}

fn split<T>(result: Result<T, FetchError>) -> (Option<T>, Option<FetchError>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayModel, TemperatureUnit};
    use crate::models::{ImageUrls, Photographer};
    use crate::providers::openweather::fixtures::*;
    use crate::providers::unsplash::fixtures::photo_json;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn weather_body() -> Value {
        json!({
            "current": current_weather_json(51.5, -0.1),
            "forecast": forecast_json(51.5, -0.1),
            "airQuality": null,
            "coordinates": { "lat": 51.5, "lon": -0.1 }
        })
    }

    fn city_body() -> Value {
        json!({
            "name": "London", "country": "United Kingdom", "countryCode": "GB",
            "population": 8908081, "latitude": 51.5, "longitude": -0.12,
            "timezone": "Europe__London", "elevationMeters": 11.0, "wikiDataId": "Q84"
        })
    }

    fn image_body() -> Value {
        serde_json::to_value(ImageResult {
            id: "img".to_string(),
            description: "Skyline".to_string(),
            urls: ImageUrls {
                small: "s".to_string(),
                regular: "r".to_string(),
                full: "f".to_string(),
            },
            photographer: Photographer {
                name: "Ada Lens".to_string(),
                username: "adalens".to_string(),
                profile_url: "https://unsplash.com/@adalens".to_string(),
            },
            download_url: "d".to_string(),
        })
        .unwrap()
    }

    async fn mount(server: &MockServer, endpoint: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{}", endpoint)))
            .respond_with(template)
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> HubClient {
        HubClient::new(format!("{}/api", server.uri())).unwrap()
    }

    #[test]
    fn test_city_suggestions() {
        let names = |input: &str| -> Vec<&str> {
            suggest_cities(input).iter().map(|c| c.name).collect()
        };

        assert_eq!(names("LON"), vec!["London"]);
        assert_eq!(names("  par "), vec!["Paris"]);
        assert_eq!(names("são"), vec!["São Paulo"]);
        assert_eq!(names("n"), Vec::<&str>::new());
        assert_eq!(names("xx"), Vec::<&str>::new());

        let broad = suggest_cities("er");
        assert_eq!(broad.iter().map(|c| c.name).collect::<Vec<_>>(), vec!["Berlin"]);
        assert_eq!(
            suggest_cities("ne")[0].query(),
            SearchQuery::new("New York", Some("US"))
        );
    }

    #[test]
    fn test_suggestions_are_capped_at_five() {
        let springs: Vec<PopularCity> = [
            "Springfield",
            "Springdale",
            "Springvale",
            "Spring Hill",
            "Springwood",
            "Springbok",
        ]
        .into_iter()
        .map(|name| PopularCity::new(name, "US", name))
        .collect();

        let found = matching_cities(&springs, "spring");
        assert_eq!(found.len(), MAX_SUGGESTIONS);
        assert_eq!(found[0].name, "Springfield");
        assert_eq!(found[4].name, "Springwood");
    }

    #[tokio::test]
    async fn test_search_merges_all_three() {
        let server = MockServer::start().await;
        mount(&server, "weather", ResponseTemplate::new(200).set_body_json(weather_body())).await;
        mount(&server, "city", ResponseTemplate::new(200).set_body_json(city_body())).await;
        mount(&server, "image", ResponseTemplate::new(200).set_body_json(image_body())).await;

        let results = client_for(&server).search("London", Some("GB")).await.unwrap();

        assert_eq!(results.weather.current["name"], "London");
        assert_eq!(results.city.unwrap().country_code, "GB");
        assert_eq!(results.image.unwrap().id, "img");
        assert!(results.city_error.is_none());
        assert!(results.image_error.is_none());
    }

    #[tokio::test]
    async fn test_city_and_image_failures_are_tolerated() {
        let server = MockServer::start().await;
        mount(&server, "weather", ResponseTemplate::new(200).set_body_json(weather_body())).await;
        mount(
            &server,
            "city",
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": "City not found", "message": "City not found" })),
        )
        .await;
        mount(&server, "image", ResponseTemplate::new(500).set_body_string("oops")).await;

        let results = client_for(&server).search("London", None).await.unwrap();

        assert!(results.city.is_none());
        assert!(results.image.is_none());
        assert_eq!(
            results.city_error,
            Some(FetchError {
                status: Some(404),
                message: "City not found".to_string()
            })
        );
        assert_eq!(results.image_error.unwrap().message, "Failed to fetch image data");
    }

    #[tokio::test]
    async fn test_weather_failure_fails_search() {
        let server = MockServer::start().await;
        mount(
            &server,
            "weather",
            ResponseTemplate::new(404).set_body_json(json!({
                "error": "City not found",
                "message": "Please check the city name and try again"
            })),
        )
        .await;
        mount(&server, "city", ResponseTemplate::new(200).set_body_json(city_body())).await;
        mount(&server, "image", ResponseTemplate::new(200).set_body_json(image_body())).await;

        let err = client_for(&server).search("Atlantis", None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to fetch weather data. Please check the city name and try again."
        );
        match err {
            AggregateError::WeatherUnavailable(source) => {
                assert_eq!(source.status, Some(404));
                assert_eq!(source.message, "Please check the city name and try again");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_replays_last_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("city", "São Paulo"))
            .and(query_param("country", "BR"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "busy" })))
            .expect(2)
            .mount(&server)
            .await;
        mount(&server, "city", ResponseTemplate::new(200).set_body_json(city_body())).await;
        mount(&server, "image", ResponseTemplate::new(200).set_body_json(image_body())).await;

        let client = client_for(&server);
        assert!(matches!(client.retry().await, Err(AggregateError::NothingToRetry)));

        assert!(client.search(" São Paulo ", Some("BR")).await.is_err());
        assert_eq!(
            client.last_search().await,
            SearchQuery::new("São Paulo", Some("BR"))
        );
        assert!(matches!(
            client.retry().await,
            Err(AggregateError::WeatherUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_city_is_rejected_locally() {
        let server = MockServer::start().await;
        let err = client_for(&server).search("   ", Some("GB")).await.unwrap_err();
        assert!(matches!(err, AggregateError::MissingCity));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_through_hub_router() {
        use crate::config::Config;
        use crate::routes::{create_router, AppState};

        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(current_weather_json(51.5, -0.1)),
            )
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(51.5, -0.1)))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(air_quality_json(51.5, -0.1, 1)))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/geo/cities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [photo_json("p1", Some("Big Ben"), None)]
            })))
            .mount(&upstream)
            .await;

        let mut config = Config::from_lookup(|_| None).unwrap();
        config.openweather_base_url = upstream.uri();
        config.geodb_base_url = upstream.uri();
        config.unsplash_base_url = upstream.uri();
        let app = create_router(AppState::new(config).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = HubClient::new(format!("http://{}/api", addr)).unwrap();
        let results = client.search("London", Some("GB")).await.unwrap();

        assert!(results.city.is_none());
        assert_eq!(results.city_error.as_ref().unwrap().message, "City not found");

        let model = DisplayModel::build(&results, TemperatureUnit::Fahrenheit);
        assert_eq!(model.temperature, "58°F");
        assert_eq!(model.air_quality.unwrap().level, "Good");
        assert_eq!(model.image.unwrap().alt, "Big Ben");
    }
}
