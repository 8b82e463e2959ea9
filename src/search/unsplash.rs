//! Unsplash API 适配器：Access Key 通过 `Authorization: Client-ID` 头发送，结果取 `results[].urls.full`。

use std::time::Duration;

use serde::Deserialize;

use super::{CandidateUrl, ImageSearchProvider, ProviderError, ProviderResult, absorb_failure};
use crate::config::SearchConfig;
use crate::query::EnhancedQuery;

#[derive(Debug, Deserialize)]
struct UnsplashResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: Option<UnsplashUrls>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    full: Option<String>,
}

pub struct UnsplashProvider {
    client: reqwest::Client,
    endpoint: String,
    access_key: String,
    per_page: u32,
    timeout: Duration,
}

impl UnsplashProvider {
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: config.unsplash_endpoint.clone(),
            access_key: config.unsplash_access_key.clone(),
            per_page: config.unsplash_per_page,
            timeout: Duration::from_secs(config.request_timeout),
        }
    }

    fn request_url(&self, query: &EnhancedQuery) -> String {
        format!(
            "{}?query={}&per_page={}&orientation=landscape",
            self.endpoint,
            urlencoding::encode(query.as_str()),
            self.per_page
        )
    }

    async fn lookup(&self, query: &EnhancedQuery) -> Result<ProviderResult, ProviderError> {
        let url = self.request_url(query);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {}", self.access_key))
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

impl ImageSearchProvider for UnsplashProvider {
    fn name(&self) -> &'static str {
        "Unsplash"
    }

    async fn search(&self, query: &EnhancedQuery) -> ProviderResult {
        absorb_failure(self.name(), self.lookup(query)).await
    }
}

fn parse_response(body: &str) -> Result<ProviderResult, ProviderError> {
    let parsed: UnsplashResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(parsed
        .results
        .into_iter()
        .filter_map(|photo| photo.urls.and_then(|urls| urls.full))
        .filter_map(|url| CandidateUrl::parse(&url))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_extracts_full_urls() {
        let body = r#"{
            "total": 2,
            "results": [
                {"id": "a", "urls": {"raw": "https://images.unsplash.com/a?raw", "full": "https://images.unsplash.com/a?full"}},
                {"id": "b", "urls": {"small": "https://images.unsplash.com/b?small"}},
                {"id": "c"}
            ]
        }"#;

        let urls = parse_response(body).expect("valid body");

        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].as_str(), "https://images.unsplash.com/a?full");
    }

    #[test]
    fn parse_response_on_error_payload_is_empty() {
        let urls = parse_response(r#"{"errors": ["OAuth error: The access token is invalid"]}"#)
            .expect("valid json");
        assert!(urls.is_empty());
    }
}
