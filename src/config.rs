use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: u64,
    pub upstream_timeout_secs: u64,
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub unsplash_access_key: String,
    pub unsplash_base_url: String,
    pub geodb_api_key: String,
    pub geodb_base_url: String,
    pub geodb_host: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// API keys are allowed to be absent: they resolve to an empty string and
    /// show up in [`Config::missing_keys`]. Numeric settings must parse.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 3001)?,
            environment: string_or("ENVIRONMENT", "development"),
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL", 300)?,
            cache_max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", 1000)?,
            upstream_timeout_secs: parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 30)?,
            openweather_api_key: lookup("OPENWEATHER_API_KEY").unwrap_or_default(),
            openweather_base_url: string_or(
                "OPENWEATHER_BASE_URL",
                "https://api.openweathermap.org/data/2.5",
            ),
            unsplash_access_key: lookup("UNSPLASH_ACCESS_KEY").unwrap_or_default(),
            unsplash_base_url: string_or("UNSPLASH_BASE_URL", "https://api.unsplash.com"),
            geodb_api_key: lookup("GEODB_API_KEY").unwrap_or_default(),
            geodb_base_url: string_or(
                "GEODB_BASE_URL",
                "https://wft-geo-db.p.rapidapi.com/v1",
            ),
            geodb_host: string_or("GEODB_HOST", "wft-geo-db.p.rapidapi.com"),
        })
    }

    /// Names of the API key variables that are unset or blank.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openweather_api_key.trim().is_empty() {
            missing.push("OPENWEATHER_API_KEY");
        }
        if self.unsplash_access_key.trim().is_empty() {
            missing.push("UNSPLASH_ACCESS_KEY");
        }
        if self.geodb_api_key.trim().is_empty() {
            missing.push("GEODB_API_KEY");
        }
        missing
    }

    /// Logs a warning for missing API keys. Never fails startup.
    pub fn warn_missing_keys(&self) {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            tracing::warn!("Missing API keys: {}", missing.join(", "));
            tracing::warn!("Some features may not work properly. Please check your .env file.");
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_apply_when_env_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.environment, "development");
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.openweather_base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.unsplash_base_url, "https://api.unsplash.com");
        assert_eq!(config.geodb_base_url, "https://wft-geo-db.p.rapidapi.com/v1");
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_keys_are_reported_not_fatal() {
        let config = config_from(&[("OPENWEATHER_API_KEY", "abc")]).unwrap();
        assert_eq!(config.missing_keys(), vec!["UNSPLASH_ACCESS_KEY", "GEODB_API_KEY"]);

        let config = config_from(&[
            ("OPENWEATHER_API_KEY", "a"),
            ("UNSPLASH_ACCESS_KEY", "b"),
            ("GEODB_API_KEY", "c"),
        ])
        .unwrap();
        assert!(config.missing_keys().is_empty());
    }

    #[test]
    fn test_numeric_overrides() {
        let config = config_from(&[("PORT", "8080"), ("CACHE_TTL", "60")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        assert!(config_from(&[("CACHE_TTL", "five minutes")]).is_err());
    }

    #[test]
    fn test_production_flag() {
        let config = config_from(&[("ENVIRONMENT", "Production")]).unwrap();
        assert!(config.is_production());
    }
}
