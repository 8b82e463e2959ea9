//! Pixabay API 适配器：API Key 以查询参数发送，结果取 `hits[].largeImageURL`。

use std::time::Duration;

use serde::Deserialize;

use super::{CandidateUrl, ImageSearchProvider, ProviderError, ProviderResult, absorb_failure};
use crate::config::SearchConfig;
use crate::query::EnhancedQuery;

/// 请求时要求的最小照片宽高。
const MIN_PHOTO_SIZE: u32 = 512;

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
}

pub struct PixabayProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl PixabayProvider {
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: config.pixabay_endpoint.clone(),
            api_key: config.pixabay_api_key.clone(),
            timeout: Duration::from_secs(config.request_timeout),
        }
    }

    fn request_url(&self, query: &EnhancedQuery) -> String {
        format!(
            "{}?key={}&q={}&image_type=photo&min_width={}&min_height={}",
            self.endpoint,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query.as_str()),
            MIN_PHOTO_SIZE,
            MIN_PHOTO_SIZE
        )
    }

    async fn lookup(&self, query: &EnhancedQuery) -> Result<ProviderResult, ProviderError> {
        let url = self.request_url(query);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, &url))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, &url))?;
        parse_response(&body)
    }
}

impl ImageSearchProvider for PixabayProvider {
    fn name(&self) -> &'static str {
        "Pixabay"
    }

    async fn search(&self, query: &EnhancedQuery) -> ProviderResult {
        absorb_failure(self.name(), self.lookup(query)).await
    }
}

fn parse_response(body: &str) -> Result<ProviderResult, ProviderError> {
    let parsed: PixabayResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(parsed
        .hits
        .into_iter()
        .filter_map(|hit| hit.large_image_url)
        .filter_map(|url| CandidateUrl::parse(&url))
        .collect())
}
