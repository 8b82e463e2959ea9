//! # 图片搜索模块（search）
//!
//! ## 设计思路
//!
//! 把“查询 → 候选图片 URL”拆成三层：
//!
//! - 提供商适配器（`pixabay` / `unsplash` / `bing`）：各自对接一个后端，
//!   把响应归一化为 `ProviderResult`。任何网络、状态码、解析错误都在适配器内部
//!   吸收为“空结果 + 一条 warn 日志”，不会上抛。
//! - `orchestrator`：随机顺序依次调用适配器，累积结果池，达到阈值提前停止。
//! - `selector`：从扁平化的结果池中等概率选出一个 URL。
//!
//! ## 实现思路
//!
//! 提供商是封闭集合，用 `ProviderAdapter` 枚举表达（静态分发、穷尽匹配）；
//! `ImageSearchProvider` trait 是唯一的能力接口，编排器对它泛型，
//! 测试可以替换为脚本化的假提供商。
//!
//! ```text
//! EnhancedQuery
//!    ↓
//! ProviderOrchestrator（随机顺序 + 早停）
//!    ├─ PixabayProvider   → largeImageURL
//!    ├─ UnsplashProvider  → urls.full
//!    └─ BingProvider      → a[href] 中的 mediaurl=
//!    ↓
//! ResultPool → Selector → CandidateUrl
//! ```

pub mod bing;
pub mod orchestrator;
pub mod pixabay;
pub mod selector;
pub mod unsplash;

use std::fmt;
use std::future::Future;

use crate::config::SearchConfig;
use crate::net::sanitize_error_message;
use crate::query::EnhancedQuery;
use crate::user_agent::UserAgentRotator;

pub use bing::BingProvider;
pub use orchestrator::ProviderOrchestrator;
pub use pixabay::PixabayProvider;
pub use selector::Selector;
pub use unsplash::UnsplashProvider;

/// 一个候选图片地址（绝对 http/https URL），尚未经过下载验证。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateUrl(String);

impl CandidateUrl {
    /// 仅接受带主机名的绝对 http/https URL。
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let parsed = reqwest::Url::parse(trimmed).ok()?;
        let is_http = matches!(parsed.scheme(), "http" | "https");
        if !is_http || parsed.host_str().is_none() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单个提供商一次调用的结果；空表示“没有结果”，不是错误。
pub type ProviderResult = Vec<CandidateUrl>;

/// 单次触发内跨提供商累积的候选池，只增不减。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPool {
    urls: Vec<CandidateUrl>,
}

impl ResultPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, batch: ProviderResult) {
        self.urls.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn as_slice(&self) -> &[CandidateUrl] {
        &self.urls
    }

    pub fn into_vec(self) -> Vec<CandidateUrl> {
        self.urls
    }
}

impl From<Vec<CandidateUrl>> for ResultPool {
    fn from(urls: Vec<CandidateUrl>) -> Self {
        Self { urls }
    }
}

/// 适配器内部错误，只在适配器内部流转。
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("请求失败：{0}")]
    Http(String),

    #[error("请求超时：{0}")]
    Timeout(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("解析失败：{0}")]
    Parse(String),
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let message = sanitize_error_message(&err.to_string(), url);
        if err.is_timeout() {
            Self::Timeout(message)
        } else {
            Self::Http(message)
        }
    }
}

/// 图片搜索能力接口：`search` 永不失败，失败即空结果。
pub trait ImageSearchProvider: Send + Sync {
    /// 用于日志的提供商名称。
    fn name(&self) -> &'static str;

    fn search(&self, query: &EnhancedQuery) -> impl Future<Output = ProviderResult> + Send;
}

/// 把适配器的 `Result` 吸收为 `ProviderResult`，并统一记录日志。
pub(crate) async fn absorb_failure<F>(name: &'static str, lookup: F) -> ProviderResult
where
    F: Future<Output = Result<ProviderResult, ProviderError>>,
{
    log::info!("🔍 {} 搜索中...", name);
    match lookup.await {
        Ok(urls) => {
            log::info!("📦 {}：找到 {} 张图片", name, urls.len());
            urls
        }
        Err(err) => {
            log::warn!("⚠️ {} 搜索失败：{}", name, err);
            Vec::new()
        }
    }
}

/// 提供商的封闭集合。
pub enum ProviderAdapter {
    Pixabay(PixabayProvider),
    Unsplash(UnsplashProvider),
    Bing(BingProvider),
}

impl ProviderAdapter {
    /// 按配置构建全部三个提供商，共用同一个 HTTP 客户端。
    pub fn all_from_config(
        config: &SearchConfig,
        client: reqwest::Client,
        user_agents: UserAgentRotator,
    ) -> Vec<Self> {
        vec![
            Self::Pixabay(PixabayProvider::new(client.clone(), config)),
            Self::Unsplash(UnsplashProvider::new(client.clone(), config)),
            Self::Bing(BingProvider::new(client, config, user_agents)),
        ]
    }
}

impl ImageSearchProvider for ProviderAdapter {
    fn name(&self) -> &'static str {
        match self {
            Self::Pixabay(provider) => provider.name(),
            Self::Unsplash(provider) => provider.name(),
            Self::Bing(provider) => provider.name(),
        }
    }

    async fn search(&self, query: &EnhancedQuery) -> ProviderResult {
        match self {
            Self::Pixabay(provider) => provider.search(query).await,
            Self::Unsplash(provider) => provider.search(query).await,
            Self::Bing(provider) => provider.search(query).await,
        }
    }
}
