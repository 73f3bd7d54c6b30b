use super::types::*;
use super::{build_http_client, fetch_json};
use crate::config::Config;
use crate::error::UpstreamError;
use reqwest::Client;

pub struct GeoDbClient {
    client: Client,
    config: Config,
}

impl GeoDbClient {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let client = build_http_client(config.upstream_timeout())?;
        Ok(Self { client, config })
    }

    /// Cities whose name starts with `name_prefix`, most populous first.
    pub async fn find_cities(
        &self,
        name_prefix: &str,
        country: Option<&str>,
        limit: u32,
    ) -> Result<Vec<GeoDbCity>, UpstreamError> {
        let url = format!("{}/geo/cities", self.config.geodb_base_url.trim_end_matches('/'));

        let mut params = vec![
            ("namePrefix", name_prefix.to_string()),
            ("limit", limit.to_string()),
            ("sort", "-population".to_string()),
        ];
        if let Some(country) = country {
            params.push(("countryIds", country.to_string()));
        }

        let request = self
            .client
            .get(url)
            .query(&params)
            .header("X-RapidAPI-Key", &self.config.geodb_api_key)
            .header("X-RapidAPI-Host", &self.config.geodb_host);

        let response: GeoDbCitiesResponse = fetch_json(request).await?;
        Ok(response.data)
    }
}
