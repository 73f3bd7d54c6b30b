use serde::{Deserialize, Serialize};
use serde_json::Value;

// OpenWeather payloads are relayed to clients untouched. The structs below are
// read views over the fields the hub and the display layer look at; anything
// else in the payload is ignored by them and preserved in the relayed JSON.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
struct Located {
    coord: Coord,
}

impl Coord {
    /// Reads the `coord` object of an OpenWeather location response.
    pub fn from_payload(payload: &Value) -> Result<Self, serde_json::Error> {
        Located::deserialize(payload).map(|located| located.coord)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherCondition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurrentSys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// `/weather`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurrentWeather {
    pub weather: Vec<WeatherCondition>,
    pub main: MainReadings,
    pub wind: Wind,
    pub dt: i64,
    pub sys: CurrentSys,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<WeatherCondition>,
}

/// `/forecast`, 5 day / 3 hour
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Forecast {
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AqiMain {
    pub aqi: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirComponents {
    pub o3: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirQualityReading {
    pub dt: i64,
    pub main: AqiMain,
    pub components: AirComponents,
}

/// `/air_pollution`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirQuality {
    pub list: Vec<AirQualityReading>,
}

// GeoDB cities, /geo/cities

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoDbCity {
    pub name: String,
    pub country: String,
    pub country_code: String,
    #[serde(default)]
    pub population: Option<u64>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub elevation_meters: Option<f64>,
    #[serde(default)]
    pub wiki_data_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoDbCitiesResponse {
    #[serde(default)]
    pub data: Vec<GeoDbCity>,
}

// Unsplash photo search, /search/photos

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUrls {
    pub small: String,
    pub regular: String,
    pub full: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUserLinks {
    pub html: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUser {
    pub name: String,
    pub username: String,
    pub links: UnsplashUserLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashPhotoLinks {
    pub download_location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alt_description: Option<String>,
    pub urls: UnsplashUrls,
    pub user: UnsplashUser,
    pub links: UnsplashPhotoLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashSearchResponse {
    #[serde(default)]
    pub results: Vec<UnsplashPhoto>,
}
