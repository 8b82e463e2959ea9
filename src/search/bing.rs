//! # Bing 图片搜索适配器（HTML 抓取）
//!
//! ## 设计思路
//!
//! Bing 没有免 Key 的图片 API，直接请求图片搜索页并解析 HTML。
//! 结果页中每个缩略图链接形如
//! `/images/search?view=detailV2&...&mediaurl=https%3A%2F%2F...&...`，
//! 其中 `mediaurl=` 参数即原图地址。
//!
//! ## 实现思路
//!
//! 1. 随机 User-Agent + 大图过滤参数发起 GET
//! 2. 用 `scraper` 扫描全部 `a[href]`，保留同时包含搜索标记与 `mediaurl=` 的链接
//! 3. 取出参数值并做百分号解码
//! 4. 仅保留 `http` 开头、路径不以 `.svg` / `.gif` 结尾的地址
//!
//! 顺序按文档顺序，不去重。`Html` 不是 `Send`，解析放在同步函数里完成。

use std::time::Duration;

use scraper::{Html, Selector};

use super::{CandidateUrl, ImageSearchProvider, ProviderError, ProviderResult, absorb_failure};
use crate::config::SearchConfig;
use crate::query::EnhancedQuery;
use crate::user_agent::UserAgentRotator;

const SEARCH_MARKER: &str = "/images/search?";
const MEDIA_PARAM: &str = "mediaurl=";
const EXCLUDED_EXTENSIONS: [&str; 2] = [".svg", ".gif"];

pub struct BingProvider {
    client: reqwest::Client,
    endpoint: String,
    user_agents: UserAgentRotator,
    timeout: Duration,
}

impl BingProvider {
    pub fn new(client: reqwest::Client, config: &SearchConfig, user_agents: UserAgentRotator) -> Self {
        Self {
            client,
            endpoint: config.bing_endpoint.clone(),
            user_agents,
            timeout: Duration::from_secs(config.request_timeout),
        }
    }

    fn request_url(&self, query: &EnhancedQuery) -> String {
        format!(
            "{}?q={}&qft=+filterui:imagesize-large",
            self.endpoint,
            urlencoding::encode(query.as_str())
        )
    }

    async fn lookup(&self, query: &EnhancedQuery) -> Result<ProviderResult, ProviderError> {
        let url = self.request_url(query);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, self.user_agents.next())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, &url))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, &url))?;
        extract_media_urls(&html)
    }
}

impl ImageSearchProvider for BingProvider {
    fn name(&self) -> &'static str {
        "Bing Images"
    }

    async fn search(&self, query: &EnhancedQuery) -> ProviderResult {
        absorb_failure(self.name(), self.lookup(query)).await
    }
}

/// 从结果页 HTML 中按文档顺序提取原图地址。
pub(crate) fn extract_media_urls(html: &str) -> Result<ProviderResult, ProviderError> {
    let document = Html::parse_document(html);
    let anchor_selector =
        Selector::parse("a[href]").map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(document
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains(SEARCH_MARKER) && href.contains(MEDIA_PARAM))
        .filter_map(media_url_from_href)
        .collect())
}

fn media_url_from_href(href: &str) -> Option<CandidateUrl> {
    let encoded = href.split(MEDIA_PARAM).nth(1)?.split('&').next()?;
    let decoded = urlencoding::decode(encoded).ok()?;

    if !decoded.starts_with("http") || has_excluded_extension(&decoded) {
        return None;
    }

    CandidateUrl::parse(&decoded)
}

/// 按 URL 路径（忽略查询串、大小写）判断是否为矢量图或动图。
fn has_excluded_extension(url: &str) -> bool {
    let path = reqwest::Url::parse(url)
        .map(|parsed| parsed.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase());

    EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
