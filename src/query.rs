//! # 查询模型与查询增强
//!
//! ## 设计思路
//!
//! - `Query`：用户从剪贴板给出的原始查询，构造时即完成 trim 与非空校验。
//! - `EnhancedQuery`：原始查询 + 一个“画质提示”后缀，是发给各提供商的最终文本。
//! - `QueryEnhancer`：从固定后缀集合中等概率抽取一个拼接到末尾。
//!
//! 空输入不是错误，而是本次触发的正常终点，由 `EmptyQuery` 通知调用方。

use std::fmt;
use std::sync::Arc;

use crate::random::RandomSource;

/// 固定的画质提示后缀集合（含空后缀），等概率抽取。
pub const QUERY_SUFFIXES: [&str; 6] = ["", " high resolution", " large size", " high quality", " HD", " 4K"];

/// 剪贴板内容 trim 后为空。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("查询内容为空")]
pub struct EmptyQuery;

/// 已 trim 且非空的原始查询。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Result<Self, EmptyQuery> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 增强后的查询文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedQuery {
    text: String,
    suffix: &'static str,
}

impl EnhancedQuery {
    pub fn new(query: &Query, suffix: &'static str) -> Self {
        Self {
            text: format!("{}{}", query.as_str(), suffix),
            suffix,
        }
    }

    /// 发给提供商的完整文本。
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn suffix(&self) -> &'static str {
        self.suffix
    }

    /// 不含后缀的原始查询部分。
    pub fn base(&self) -> &str {
        &self.text[..self.text.len() - self.suffix.len()]
    }
}

impl fmt::Display for EnhancedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 查询增强器。
#[derive(Clone)]
pub struct QueryEnhancer {
    rng: Arc<RandomSource>,
}

impl QueryEnhancer {
    pub fn new(rng: Arc<RandomSource>) -> Self {
        Self { rng }
    }

    /// trim 原始输入并追加一个随机后缀。
    ///
    /// # 示例
    /// ```rust
    /// use std::sync::Arc;
    /// use clipboard_image_search::query::{QueryEnhancer, QUERY_SUFFIXES};
    /// use clipboard_image_search::random::RandomSource;
    ///
    /// let enhancer = QueryEnhancer::new(Arc::new(RandomSource::seeded(1)));
    /// let enhanced = enhancer.enhance("  red fox \n").unwrap();
    /// assert_eq!(enhanced.base(), "red fox");
    /// assert!(QUERY_SUFFIXES.contains(&enhanced.suffix()));
    /// assert!(enhancer.enhance("   ").is_err());
    /// ```
    pub fn enhance(&self, raw: &str) -> Result<EnhancedQuery, EmptyQuery> {
        let query = Query::parse(raw)?;
        Ok(self.enhance_query(&query))
    }

    pub fn enhance_query(&self, query: &Query) -> EnhancedQuery {
        let suffix = self.rng.choose(&QUERY_SUFFIXES).copied().unwrap_or("");
        EnhancedQuery::new(query, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enhancer(seed: u64) -> QueryEnhancer {
        QueryEnhancer::new(Arc::new(RandomSource::seeded(seed)))
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        assert_eq!(enhancer(0).enhance(""), Err(EmptyQuery));
        assert_eq!(enhancer(0).enhance(" \t\r\n "), Err(EmptyQuery));
    }

    #[test]
    fn every_suffix_is_reachable() {
        let enhancer = enhancer(5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let enhanced = enhancer.enhance("cat").expect("non-empty query");
            seen.insert(enhanced.suffix());
        }
        assert_eq!(seen.len(), QUERY_SUFFIXES.len());
    }

    #[test]
    fn base_and_suffix_split_the_text() {
        let query = Query::parse("  mountain lake ").expect("non-empty query");
        let enhanced = EnhancedQuery::new(&query, " 4K");

        assert_eq!(enhanced.as_str(), "mountain lake 4K");
        assert_eq!(enhanced.base(), "mountain lake");
        assert_eq!(enhanced.to_string(), "mountain lake 4K");
    }

    proptest! {
        #[test]
        fn enhanced_query_keeps_trimmed_input_and_known_suffix(raw in "\\PC{0,40}", seed in any::<u64>()) {
            prop_assume!(!raw.trim().is_empty());

            let enhanced = enhancer(seed).enhance(&raw).expect("non-empty query");

            prop_assert!(enhanced.as_str().starts_with(raw.trim()));
            prop_assert!(QUERY_SUFFIXES.iter().any(|suffix| enhanced.as_str().ends_with(suffix)));
            prop_assert_eq!(enhanced.base(), raw.trim());
        }
    }
}
