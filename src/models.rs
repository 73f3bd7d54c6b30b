use crate::providers::types::{
    AirQuality, Coord, CurrentWeather, Forecast, GeoDbCity, UnsplashPhoto,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of `GET /api/weather`.
///
/// `current`, `forecast` and `airQuality` are the provider's bodies verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResult {
    pub current: Value,
    pub forecast: Value,
    /// `null` when the air-quality lookup failed.
    pub air_quality: Option<Value>,
    pub coordinates: Coord,
}

impl WeatherResult {
    pub fn current_view(&self) -> CurrentWeather {
        view(&self.current)
    }

    pub fn forecast_view(&self) -> Forecast {
        view(&self.forecast)
    }

    pub fn air_quality_view(&self) -> Option<AirQuality> {
        self.air_quality.as_ref().map(view)
    }
}

/// Reads a typed view of a relayed payload; fields of the wrong shape read as
/// their defaults.
fn view<T: serde::de::DeserializeOwned + Default>(payload: &Value) -> T {
    T::deserialize(payload).unwrap_or_else(|e| {
        tracing::warn!("Unexpected weather payload shape: {}", e);
        T::default()
    })
}

/// Payload of `GET /api/city`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityResult {
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub population: Option<u64>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub elevation_meters: Option<f64>,
    pub wiki_data_id: Option<String>,
}

impl From<GeoDbCity> for CityResult {
    fn from(city: GeoDbCity) -> Self {
        Self {
            name: city.name,
            country: city.country,
            country_code: city.country_code,
            population: city.population,
            latitude: city.latitude,
            longitude: city.longitude,
            timezone: city.timezone,
            elevation_meters: city.elevation_meters,
            wiki_data_id: city.wiki_data_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrls {
    pub small: String,
    pub regular: String,
    pub full: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photographer {
    pub name: String,
    pub username: String,
    pub profile_url: String,
}

/// Payload of `GET /api/image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub id: String,
    pub description: String,
    pub urls: ImageUrls,
    pub photographer: Photographer,
    pub download_url: String,
}

impl ImageResult {
    /// Shapes a search hit; the description falls back to the alt text and
    /// then to `"<city> cityscape"`.
    pub fn from_photo(photo: UnsplashPhoto, city: &str) -> Self {
        let description = photo
            .description
            .filter(|d| !d.trim().is_empty())
            .or(photo.alt_description.filter(|d| !d.trim().is_empty()))
            .unwrap_or_else(|| format!("{} cityscape", city));

        Self {
            id: photo.id,
            description,
            urls: ImageUrls {
                small: photo.urls.small,
                regular: photo.urls.regular,
                full: photo.urls.full,
            },
            photographer: Photographer {
                name: photo.user.name,
                username: photo.user.username,
                profile_url: photo.user.links.html,
            },
            download_url: photo.links.download_location,
        }
    }
}
