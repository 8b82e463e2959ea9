//! # 配置模块
//!
//! ## 设计思路
//!
//! 所有可调参数集中在 `AppConfig`：搜索相关的 `SearchConfig` 与下载/解码相关的
//! `FetchConfig`。`Default` 即生产可用配置；环境变量只做覆盖，不做持久化。
//! 凭据在启动时读取一次，运行期只读。
//!
//! ## 实现思路
//!
//! - `from_env` 读取进程环境；`from_lookup` 接收任意查找函数，便于测试。
//! - `validate` 对阈值、超时、最小边长做范围校验，非法值在启动时直接失败。

use crate::error::AppError;
use crate::image_fetcher::{FetchConfig, MIN_DIMENSION_FLOOR};

pub const ENV_PIXABAY_API_KEY: &str = "PIXABAY_API_KEY";
pub const ENV_UNSPLASH_ACCESS_KEY: &str = "UNSPLASH_ACCESS_KEY";
pub const ENV_MIN_DIMENSION: &str = "CLIP_SEARCH_MIN_DIMENSION";
pub const ENV_EARLY_STOP: &str = "CLIP_SEARCH_EARLY_STOP";
pub const ENV_TIMEOUT_SECS: &str = "CLIP_SEARCH_TIMEOUT_SECS";

/// 图片搜索配置。
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Pixabay API 地址。
    pub pixabay_endpoint: String,
    /// Pixabay API Key（作为查询参数发送）。
    pub pixabay_api_key: String,
    /// Unsplash 搜索 API 地址。
    pub unsplash_endpoint: String,
    /// Unsplash Access Key（作为 `Authorization: Client-ID` 头发送）。
    pub unsplash_access_key: String,
    pub unsplash_per_page: u32,
    /// Bing 图片搜索页面地址。
    pub bing_endpoint: String,
    /// 单个提供商请求超时（秒）。
    pub request_timeout: u64,
    /// 结果池达到该数量后不再调用后续提供商。
    pub early_stop_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pixabay_endpoint: "https://pixabay.com/api/".to_string(),
            pixabay_api_key: String::new(),
            unsplash_endpoint: "https://api.unsplash.com/search/photos".to_string(),
            unsplash_access_key: String::new(),
            unsplash_per_page: 10,
            bing_endpoint: "https://www.bing.com/images/search".to_string(),
            request_timeout: 10,
            early_stop_threshold: 5,
        }
    }
}

/// 应用配置。
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// 默认配置 + 进程环境变量覆盖。
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 默认配置 + 任意来源覆盖。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup(ENV_PIXABAY_API_KEY) {
            config.search.pixabay_api_key = key.trim().to_string();
        }
        if let Some(key) = lookup(ENV_UNSPLASH_ACCESS_KEY) {
            config.search.unsplash_access_key = key.trim().to_string();
        }
        if let Some(value) = lookup(ENV_MIN_DIMENSION) {
            config.fetch.min_dimension = parse_number(ENV_MIN_DIMENSION, &value)?;
        }
        if let Some(value) = lookup(ENV_EARLY_STOP) {
            config.search.early_stop_threshold = parse_number(ENV_EARLY_STOP, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = parse_number(ENV_TIMEOUT_SECS, &value)?;
            config.search.request_timeout = secs;
            config.fetch.download_timeout = secs;
            config.fetch.connect_timeout = config.fetch.connect_timeout.min(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.search.early_stop_threshold == 0 {
            return Err(AppError::Config("early_stop_threshold 必须大于 0".to_string()));
        }
        if !(1..=120).contains(&self.search.request_timeout) {
            return Err(AppError::Config("request_timeout 必须在 1~120 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.fetch.download_timeout) {
            return Err(AppError::Config("download_timeout 必须在 1~120 秒之间".to_string()));
        }
        if self.fetch.connect_timeout == 0 || self.fetch.connect_timeout > self.fetch.download_timeout {
            return Err(AppError::Config(
                "connect_timeout 必须大于 0 且不超过 download_timeout".to_string(),
            ));
        }
        if !(MIN_DIMENSION_FLOOR..=8192).contains(&self.fetch.min_dimension) {
            return Err(AppError::Config(format!(
                "min_dimension 必须在 {}~8192 之间",
                MIN_DIMENSION_FLOOR
            )));
        }
        Ok(())
    }

    /// 用于启动日志：只显示凭据是否配置，不输出内容。
    pub fn credentials_summary(&self) -> String {
        format!(
            "pixabay_key={} unsplash_key={}",
            if self.search.pixabay_api_key.is_empty() { "未配置" } else { "已配置" },
            if self.search.unsplash_access_key.is_empty() { "未配置" } else { "已配置" },
        )
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("{} 不是合法数字：{}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.search.early_stop_threshold, 5);
        assert_eq!(config.search.request_timeout, 10);
        assert_eq!(config.fetch.download_timeout, 10);
        assert_eq!(config.fetch.min_dimension, 512);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_PIXABAY_API_KEY, " pixa-key "),
            (ENV_UNSPLASH_ACCESS_KEY, "unsplash-key"),
            (ENV_EARLY_STOP, "8"),
            (ENV_TIMEOUT_SECS, "15"),
        ]))
        .expect("config should load");

        assert_eq!(config.search.pixabay_api_key, "pixa-key");
        assert_eq!(config.search.unsplash_access_key, "unsplash-key");
        assert_eq!(config.search.early_stop_threshold, 8);
        assert_eq!(config.search.request_timeout, 15);
        assert_eq!(config.fetch.download_timeout, 15);
    }

    #[test]
    fn missing_credentials_are_not_an_error() {
        let config = AppConfig::from_lookup(|_| None).expect("config should load");
        assert!(config.search.pixabay_api_key.is_empty());
        assert!(config.credentials_summary().contains("pixabay_key=未配置"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[(ENV_EARLY_STOP, "many")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = AppConfig::from_lookup(lookup_from(&[(ENV_EARLY_STOP, "0")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = AppConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "0")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = AppConfig::from_lookup(lookup_from(&[(ENV_MIN_DIMENSION, "0")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn min_dimension_cannot_drop_below_floor() {
        let result = AppConfig::from_lookup(lookup_from(&[(ENV_MIN_DIMENSION, "511")]));
        assert!(matches!(result, Err(AppError::Config(_))));

        let config = AppConfig::from_lookup(lookup_from(&[(ENV_MIN_DIMENSION, "1024")]))
            .expect("larger minimum should be accepted");
        assert_eq!(config.fetch.min_dimension, 1024);
    }
}
