//! Render-time view of an aggregated search.
//!
//! Everything here is a pure function of stored Celsius values and a unit
//! preference, so switching units re-renders without refetching.

use crate::aggregator::SearchResults;
use crate::models::{CityResult, ImageResult};
use crate::providers::types::{AirQuality, CurrentWeather, ForecastItem};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 3-hour slots per day in the forecast list.
const SLOTS_PER_DAY: usize = 8;
const FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(format!("Unknown temperature unit: {}", other)),
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Converts and rounds half up, e.g. 21.5°C -> 22, -2.5°C -> -2.
pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> i64 {
    let value = match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
    };
    (value + 0.5).floor() as i64
}

pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", convert_temperature(celsius, unit), unit.symbol())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AqiLevel {
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            5 => AqiLevel::VeryPoor,
            _ => AqiLevel::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
            AqiLevel::Unknown => "Unknown",
        }
    }
}

/// Icon for an OpenWeather icon code such as `"10n"`.
pub fn weather_icon(code: &str) -> &'static str {
    match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" | "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "10d" => "🌦️",
        "09n" | "10n" => "🌧️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => "🌤️",
    }
}

/// Before sunrise or after sunset. A missing sun time never counts as night.
pub fn is_night_time(dt: i64, sunrise: Option<i64>, sunset: Option<i64>) -> bool {
    sunrise.is_some_and(|rise| dt < rise) || sunset.is_some_and(|set| dt > set)
}

/// Broad condition family, used for the background and the headline icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherScene {
    Clear,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Misty,
}

impl WeatherScene {
    const ALL: [WeatherScene; 6] = [
        WeatherScene::Clear,
        WeatherScene::Cloudy,
        WeatherScene::Rainy,
        WeatherScene::Snowy,
        WeatherScene::Stormy,
        WeatherScene::Misty,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            WeatherScene::Clear => &["clear", "sunny"],
            WeatherScene::Cloudy => &["clouds", "overcast", "partly"],
            WeatherScene::Rainy => &["rain", "drizzle", "shower"],
            WeatherScene::Snowy => &["snow", "sleet", "blizzard"],
            WeatherScene::Stormy => &["thunderstorm", "storm"],
            WeatherScene::Misty => &["mist", "fog", "haze"],
        }
    }

    /// First family with a keyword contained in the condition, e.g. `"Drizzle"` -> Rainy.
    pub fn from_condition(condition: &str) -> Option<Self> {
        let condition = condition.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|scene| scene.keywords().iter().any(|k| condition.contains(k)))
    }

    pub fn class(&self) -> &'static str {
        match self {
            WeatherScene::Clear => "clear",
            WeatherScene::Cloudy => "cloudy",
            WeatherScene::Rainy => "rainy",
            WeatherScene::Snowy => "snowy",
            WeatherScene::Stormy => "stormy",
            WeatherScene::Misty => "misty",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WeatherScene::Clear => "☀️",
            WeatherScene::Cloudy => "☁️",
            WeatherScene::Rainy => "🌧️",
            WeatherScene::Snowy => "❄️",
            WeatherScene::Stormy => "⛈️",
            WeatherScene::Misty => "🌫️",
        }
    }
}

fn is_night(current: &CurrentWeather) -> bool {
    is_night_time(current.dt, current.sys.sunrise, current.sys.sunset)
}

fn condition(current: &CurrentWeather) -> &str {
    current.weather.first().map(|w| w.main.as_str()).unwrap_or_default()
}

/// Background class: `night` after dark, otherwise the scene, `sunny` when
/// nothing matches.
pub fn background_class(current: &CurrentWeather) -> &'static str {
    if is_night(current) {
        return "night";
    }
    WeatherScene::from_condition(condition(current))
        .map(|scene| scene.class())
        .unwrap_or("sunny")
}

/// Scene icon, with a moon for clear skies at night.
pub fn scene_icon(current: &CurrentWeather) -> &'static str {
    let condition = condition(current);
    if is_night(current) && condition.eq_ignore_ascii_case("clear") {
        return "🌙";
    }
    WeatherScene::from_condition(condition)
        .unwrap_or(WeatherScene::Clear)
        .icon()
}

/// `"Weather in <city>: <temp><unit>, <description>"`, using the searched name.
pub fn share_text(results: &SearchResults, unit: TemperatureUnit) -> String {
    let current = results.weather.current_view();
    format!(
        "Weather in {}: {}, {}",
        results.query.city,
        format_temperature(current.main.temp, unit),
        description(&current)
    )
}

fn description(current: &CurrentWeather) -> String {
    current
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_default()
}

/// One entry per day: every 8th 3-hour slot, at most five.
pub fn daily_forecasts(list: &[ForecastItem]) -> Vec<&ForecastItem> {
    list.iter().step_by(SLOTS_PER_DAY).take(FORECAST_DAYS).collect()
}

/// Thousands separators, e.g. 8908081 -> "8,908,081".
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityDisplay {
    pub index: u8,
    pub level: String,
    pub pm2_5: String,
    pub pm10: String,
    pub o3: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityInfoDisplay {
    pub population: String,
    pub timezone: String,
    pub elevation: String,
    pub coordinates: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub day: String,
    pub temperature: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDisplay {
    pub url: String,
    pub alt: String,
    pub credit: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub location: String,
    pub icon: String,
    pub scene_icon: String,
    pub background: String,
    pub temperature: String,
    pub feels_like: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub air_quality: Option<AirQualityDisplay>,
    pub city_info: Option<CityInfoDisplay>,
    pub forecast: Vec<ForecastDay>,
    pub image: Option<ImageDisplay>,
    pub unit: TemperatureUnit,
}

impl DisplayModel {
    pub fn build(results: &SearchResults, unit: TemperatureUnit) -> Self {
        let current = results.weather.current_view();
        let forecast = results.weather.forecast_view();
        let location = match current.sys.country.as_deref() {
            Some(country) => format!("{}, {}", current.name, country),
            None => current.name.clone(),
        };
        let icon_code = current.weather.first().map(|w| w.icon.as_str()).unwrap_or_default();

        Self {
            location,
            icon: weather_icon(icon_code).to_string(),
            scene_icon: scene_icon(&current).to_string(),
            background: background_class(&current).to_string(),
            temperature: format_temperature(current.main.temp, unit),
            feels_like: format_temperature(current.main.feels_like, unit),
            description: description(&current),
            humidity: format!("{}%", current.main.humidity),
            wind: format!("{} m/s", current.wind.speed),
            pressure: format!("{} hPa", current.main.pressure),
            air_quality: results
                .weather
                .air_quality_view()
                .as_ref()
                .and_then(air_quality_display),
            city_info: results.city.as_ref().map(city_info_display),
            forecast: daily_forecasts(&forecast.list)
                .into_iter()
                .map(|item| forecast_day(item, unit))
                .collect(),
            image: results.image.as_ref().map(image_display),
            unit,
        }
    }
}

fn air_quality_display(air: &AirQuality) -> Option<AirQualityDisplay> {
    let reading = air.list.first()?;
    Some(AirQualityDisplay {
        index: reading.main.aqi,
        level: AqiLevel::from_index(reading.main.aqi).label().to_string(),
        pm2_5: format!("{} μg/m³", reading.components.pm2_5.round()),
        pm10: format!("{} μg/m³", reading.components.pm10.round()),
        o3: format!("{} μg/m³", reading.components.o3.round()),
    })
}

// Zero, empty and absent values all render as N/A.
fn city_info_display(city: &CityResult) -> CityInfoDisplay {
    let na = || "N/A".to_string();
    let coordinates = if city.latitude != 0.0 && city.longitude != 0.0 {
        format!("{:.2}, {:.2}", city.latitude, city.longitude)
    } else {
        na()
    };
    CityInfoDisplay {
        population: city
            .population
            .filter(|p| *p != 0)
            .map(format_number)
            .unwrap_or_else(na),
        timezone: city
            .timezone
            .clone()
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(na),
        elevation: city
            .elevation_meters
            .filter(|m| *m != 0.0)
            .map(|m| format!("{} m", m))
            .unwrap_or_else(na),
        coordinates,
    }
}

fn forecast_day(item: &ForecastItem, unit: TemperatureUnit) -> ForecastDay {
    let day = DateTime::from_timestamp(item.dt, 0)
        .map(|dt| dt.format("%a").to_string())
        .unwrap_or_default();
    ForecastDay {
        day,
        temperature: format_temperature(item.main.temp, unit),
        description: item
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default(),
    }
}

fn image_display(image: &ImageResult) -> ImageDisplay {
    ImageDisplay {
        url: image.urls.regular.clone(),
        alt: image.description.clone(),
        credit: format!("Photo by {} on Unsplash", image.photographer.name),
        profile_url: image.photographer.profile_url.clone(),
    }
}
