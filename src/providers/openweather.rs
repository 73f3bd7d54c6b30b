use super::{build_http_client, fetch_json};
use crate::config::Config;
use crate::error::UpstreamError;
use reqwest::Client;
use serde_json::Value;

pub struct OpenWeatherClient {
    client: Client,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let client = build_http_client(config.upstream_timeout())?;
        Ok(Self { client, config })
    }

    /// Current conditions looked up by name. Also the geocoding step: the
    /// response carries the coordinates used by the follow-up calls.
    ///
    /// Payloads are returned as the provider sent them.
    pub async fn current_weather(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let query = match country {
            Some(country) => format!("{},{}", city, country),
            None => city.to_string(),
        };

        let request = self.client.get(self.url("/weather")).query(&[
            ("q", query.as_str()),
            ("appid", self.config.openweather_api_key.as_str()),
            ("units", "metric"),
        ]);

        fetch_json(request).await
    }

    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<Value, UpstreamError> {
        if !is_valid_coordinates(lat, lon) {
            return Err(UpstreamError::InvalidCoordinates);
        }

        let request = self.client.get(self.url("/forecast")).query(&[
            ("lat", lat.to_string().as_str()),
            ("lon", lon.to_string().as_str()),
            ("appid", self.config.openweather_api_key.as_str()),
            ("units", "metric"),
        ]);

        fetch_json(request).await
    }

    pub async fn air_quality(&self, lat: f64, lon: f64) -> Result<Value, UpstreamError> {
        if !is_valid_coordinates(lat, lon) {
            return Err(UpstreamError::InvalidCoordinates);
        }

        let request = self.client.get(self.url("/air_pollution")).query(&[
            ("lat", lat.to_string().as_str()),
            ("lon", lon.to_string().as_str()),
            ("appid", self.config.openweather_api_key.as_str()),
        ]);

        fetch_json(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.openweather_base_url.trim_end_matches('/'), path)
    }
}

fn is_valid_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn current_weather_json(lat: f64, lon: f64) -> Value {
        json!({
            "coord": { "lat": lat, "lon": lon },
            "weather": [
                { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
            ],
            "main": {
                "temp": 14.2, "feels_like": 13.6, "temp_min": 12.9, "temp_max": 15.4,
                "pressure": 1012.0, "humidity": 77.0
            },
            "visibility": 10000,
            "wind": { "speed": 4.1, "deg": 240.0 },
            "clouds": { "all": 75.0 },
            "dt": 1760000000,
            "sys": { "country": "GB", "sunrise": 1759990000, "sunset": 1760030000 },
            "timezone": 3600,
            "id": 2643743,
            "name": "London"
        })
    }

    pub fn forecast_json(lat: f64, lon: f64) -> Value {
        let list: Vec<Value> = (0..16i64)
            .map(|i| {
                json!({
                    "dt": 1760000000 + i * 10800,
                    "main": {
                        "temp": 10.0 + i as f64, "feels_like": 9.0,
                        "temp_min": 8.0, "temp_max": 12.0,
                        "pressure": 1010.0, "humidity": 80.0
                    },
                    "weather": [
                        { "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }
                    ],
                    "clouds": { "all": 90.0 },
                    "wind": { "speed": 5.0, "deg": 200.0 },
                    "pop": 0.4,
                    "dt_txt": "2025-10-09 09:00:00"
                })
            })
            .collect();

        json!({
            "cod": "200",
            "cnt": list.len(),
            "list": list,
            "city": {
                "id": 2643743,
                "name": "London",
                "coord": { "lat": lat, "lon": lon },
                "country": "GB",
                "population": 1000000,
                "timezone": 3600
            }
        })
    }

    pub fn air_quality_json(lat: f64, lon: f64, aqi: u8) -> Value {
        json!({
            "coord": { "lat": lat, "lon": lon },
            "list": [{
                "dt": 1760000000,
                "main": { "aqi": aqi },
                "components": {
                    "co": 201.9, "no": 0.0, "no2": 20.1, "o3": 68.7,
                    "so2": 1.8, "pm2_5": 7.4, "pm10": 11.2, "nh3": 0.6
                }
            }]
        })
    }
}
