use super::types::*;
use super::{build_http_client, fetch_json};
use crate::config::Config;
use crate::error::UpstreamError;
use reqwest::Client;

pub struct UnsplashClient {
    client: Client,
    config: Config,
}

impl UnsplashClient {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let client = build_http_client(config.upstream_timeout())?;
        Ok(Self { client, config })
    }

    pub async fn search_photos(
        &self,
        query: &str,
        per_page: u32,
        orientation: &str,
    ) -> Result<Vec<UnsplashPhoto>, UpstreamError> {
        let url = format!("{}/search/photos", self.config.unsplash_base_url.trim_end_matches('/'));

        let request = self
            .client
            .get(url)
            .query(&[
                ("query", query),
                ("per_page", per_page.to_string().as_str()),
                ("orientation", orientation),
            ])
            .header(
                "Authorization",
                format!("Client-ID {}", self.config.unsplash_access_key),
            );

        let response: UnsplashSearchResponse = fetch_json(request).await?;
        Ok(response.results)
    }
}
