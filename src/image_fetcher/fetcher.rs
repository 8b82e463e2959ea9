//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageFetcher` 只负责流程编排：
//! 1. 下载原始字节（`loader`）
//! 2. 解码并按最小边长放大（`pipeline`）
//!
//! 对外契约是 `fetch -> Option<Bitmap>`：任何下载或解码失败都只记录日志，
//! 不向上抛出。需要具体失败原因的调用方（测试、诊断）使用 `try_fetch`。
//!
//! ## 实现思路
//!
//! - HTTP 客户端在构造时创建一次并复用。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。

use std::time::Instant;

use super::source::Bitmap;
use super::{FetchConfig, ImageError};
use crate::net::redact_url_for_log;
use crate::search::CandidateUrl;
use crate::user_agent::UserAgentRotator;

/// 图片下载器。
pub struct ImageFetcher {
    pub(super) config: FetchConfig,
    pub(super) client: reqwest::Client,
    pub(super) user_agents: UserAgentRotator,
}

impl ImageFetcher {
    /// 根据配置创建下载器。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use clipboard_image_search::image_fetcher::{FetchConfig, ImageFetcher};
    /// use clipboard_image_search::random::RandomSource;
    /// use clipboard_image_search::user_agent::UserAgentRotator;
    ///
    /// let rotator = UserAgentRotator::new(Arc::new(RandomSource::from_entropy()));
    /// let fetcher = ImageFetcher::new(FetchConfig::default(), rotator)?;
    /// # Ok::<(), clipboard_image_search::image_fetcher::ImageError>(())
    /// ```
    pub fn new(config: FetchConfig, user_agents: UserAgentRotator) -> Result<Self, ImageError> {
        let client = Self::build_http_client(&config)?;
        Ok(Self {
            config,
            client,
            user_agents,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// 下载并规范化图片；失败时记录日志并返回 `None`。
    pub async fn fetch(&self, url: &CandidateUrl) -> Option<Bitmap> {
        match self.try_fetch(url).await {
            Ok(bitmap) => Some(bitmap),
            Err(err) => {
                log::warn!(
                    "❌ 图片下载失败 - URL: {} 原因: {}",
                    redact_url_for_log(url.as_str()),
                    err
                );
                None
            }
        }
    }

    /// 下载并规范化图片，返回具体失败原因。
    pub async fn try_fetch(&self, url: &CandidateUrl) -> Result<Bitmap, ImageError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = self.download(url.as_str()).await?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let bitmap = self.decode_and_normalize(raw)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 图片准备完成 - {}x{} load={}ms decode={}ms total={}ms",
            bitmap.width(),
            bitmap.height(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(bitmap)
    }
}
