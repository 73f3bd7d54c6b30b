use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    cache::{cache_key, CacheStats, ResourceKind, ResponseCache},
    config::Config,
    error::{ApiError, UpstreamError},
    models::{CityResult, ImageResult, WeatherResult},
    providers::{
        geodb::GeoDbClient, openweather::OpenWeatherClient, types::Coord, unsplash::UnsplashClient,
    },
};

pub const AVAILABLE_ENDPOINTS: [&str; 6] = [
    "GET /api/weather?city=London&country=GB",
    "GET /api/city?city=London&country=GB",
    "GET /api/image?city=London&country=GB",
    "GET /api/health",
    "DELETE /api/cache",
    "DELETE /api/cache/:key",
];

const IMAGE_RESULTS_PER_PAGE: u32 = 5;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<ResponseCache>,
    pub weather_client: Arc<OpenWeatherClient>,
    pub city_client: Arc<GeoDbClient>,
    pub image_client: Arc<UnsplashClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let cache = ResponseCache::new(config.cache_ttl(), config.cache_max_entries);
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: Config, cache: ResponseCache) -> Result<Self, UpstreamError> {
        Ok(Self {
            weather_client: Arc::new(OpenWeatherClient::new(config.clone())?),
            city_client: Arc::new(GeoDbClient::new(config.clone())?),
            image_client: Arc::new(UnsplashClient::new(config.clone())?),
            cache: Arc::new(cache),
            config: Arc::new(config),
        })
    }
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl LocationQuery {
    /// Unpacks the extractor result; a malformed query string is a JSON 400.
    fn extract(
        query: Result<Query<Self>, QueryRejection>,
        kind: ResourceKind,
    ) -> Result<(String, Option<String>), ApiError> {
        let Query(params) = query.map_err(|rejection| {
            tracing::warn!("Rejected {} query: {}", kind.as_str(), rejection.body_text());
            ApiError::invalid_query(kind.as_str(), rejection.body_text())
        })?;
        params.require(kind)
    }

    /// Trimmed city and country; a blank city is treated as missing.
    fn require(&self, kind: ResourceKind) -> Result<(String, Option<String>), ApiError> {
        let city = self
            .city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::validation(kind.as_str()))?;
        let country = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok((city.to_string(), country))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub cache: CacheHealth,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub keys: u64,
    pub stats: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct CacheKeyDeleted {
    pub message: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCleared {
    pub message: String,
    pub keys_cleared: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointNotFound {
    pub error: String,
    pub available_endpoints: Vec<String>,
}

// Route handlers
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.cache.stats();
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: CacheHealth {
            keys: stats.keys,
            stats,
        },
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let (city, country) = LocationQuery::extract(query, ResourceKind::Weather)?;
    let key = cache_key(ResourceKind::Weather, &city, country.as_deref());

    state
        .cache
        .get_or_compute(&key, fetch_weather(&state, &city, country.as_deref()))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Weather API error: {}", e);
            e.redacted(state.config.is_production())
        })
}

pub async fn get_city(
    State(state): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let (city, country) = LocationQuery::extract(query, ResourceKind::City)?;
    let key = cache_key(ResourceKind::City, &city, country.as_deref());

    state
        .cache
        .get_or_compute(&key, fetch_city(&state, &city, country.as_deref()))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("City API error: {}", e);
            e.redacted(state.config.is_production())
        })
}

pub async fn get_image(
    State(state): State<AppState>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let (city, country) = LocationQuery::extract(query, ResourceKind::Image)?;
    let key = cache_key(ResourceKind::Image, &city, country.as_deref());

    state
        .cache
        .get_or_compute(&key, fetch_image(&state, &city, country.as_deref()))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Image API error: {}", e);
            e.redacted(state.config.is_production())
        })
}

pub async fn clear_cache_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<CacheKeyDeleted> {
    let deleted = state.cache.remove(&key).await;
    let message = if deleted {
        format!("Cache key '{}' cleared", key)
    } else {
        format!("Cache key '{}' not found", key)
    };
    tracing::info!("{}", message);
    Json(CacheKeyDeleted { message, deleted })
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheCleared> {
    let keys_cleared = state.cache.clear().await;
    tracing::info!("Cleared {} cache keys", keys_cleared);
    Json(CacheCleared {
        message: "All cache cleared".to_string(),
        keys_cleared,
    })
}

pub async fn endpoint_not_found() -> (StatusCode, Json<EndpointNotFound>) {
    (
        StatusCode::NOT_FOUND,
        Json(EndpointNotFound {
            error: "Endpoint not found".to_string(),
            available_endpoints: AVAILABLE_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }),
    )
}

// Upstream sequences run on a cache miss

async fn fetch_weather(
    state: &AppState,
    city: &str,
    country: Option<&str>,
) -> Result<Value, ApiError> {
    let current = state
        .weather_client
        .current_weather(city, country)
        .await
        .map_err(weather_error)?;
    let coordinates = Coord::from_payload(&current)
        .map_err(|e| weather_error(UpstreamError::JsonParsing(e)))?;

    let forecast = state
        .weather_client
        .forecast(coordinates.lat, coordinates.lon)
        .await
        .map_err(weather_error)?;

    // Air quality is optional; its failure never fails the request.
    let air_quality = match state
        .weather_client
        .air_quality(coordinates.lat, coordinates.lon)
        .await
    {
        Ok(air_quality) => Some(air_quality),
        Err(e) => {
            tracing::warn!("Air quality data not available: {}", e);
            None
        }
    };

    to_payload(&WeatherResult {
        current,
        forecast,
        air_quality,
        coordinates,
    })
}

async fn fetch_city(
    state: &AppState,
    city: &str,
    country: Option<&str>,
) -> Result<Value, ApiError> {
    let top_match = state
        .city_client
        .find_cities(city, country, 1)
        .await
        .map_err(city_error)?
        .into_iter()
        .next()
        .ok_or_else(city_not_found)?;

    to_payload(&CityResult::from(top_match))
}

async fn fetch_image(
    state: &AppState,
    city: &str,
    country: Option<&str>,
) -> Result<Value, ApiError> {
    let query = match country {
        Some(country) => format!("{}, {}", city, country),
        None => city.to_string(),
    };

    let photo = state
        .image_client
        .search_photos(&query, IMAGE_RESULTS_PER_PAGE, "landscape")
        .await
        .map_err(image_error)?
        .into_iter()
        .next()
        .ok_or_else(image_not_found)?;

    to_payload(&ImageResult::from_photo(photo, city))
}

fn to_payload<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn weather_error(err: UpstreamError) -> ApiError {
    match err {
        UpstreamError::NotFound(_) => {
            ApiError::not_found("City not found", "Please check the city name and try again")
        }
        other => ApiError::Upstream {
            context: "Failed to fetch weather data".to_string(),
            message: other.to_string(),
        },
    }
}

fn city_not_found() -> ApiError {
    ApiError::not_found("City not found", "City not found")
}

fn city_error(err: UpstreamError) -> ApiError {
    match err {
        UpstreamError::NotFound(_) => city_not_found(),
        other => ApiError::Upstream {
            context: "Failed to fetch city data".to_string(),
            message: other.to_string(),
        },
    }
}

fn image_not_found() -> ApiError {
    ApiError::not_found("No images found", "No images available for this city")
}

fn image_error(err: UpstreamError) -> ApiError {
    match err {
        UpstreamError::NotFound(_) => image_not_found(),
        other => ApiError::Upstream {
            context: "Failed to fetch city image".to_string(),
            message: other.to_string(),
        },
    }
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/weather", get(get_weather))
        .route("/api/city", get(get_city))
        .route("/api/image", get(get_image))
        .route("/api/cache", delete(clear_cache))
        .route("/api/cache/:key", delete(clear_cache_key))
        .method_not_allowed_fallback(endpoint_not_found)
        .fallback(endpoint_not_found)
        .with_state(state)
}
