//! # User-Agent 轮换
//!
//! 每次出站请求随机取一个真实浏览器的 UA，降低被抓取站点识别并拦截的概率。
//! 不记忆历史，不刻意避免连续重复。

use std::sync::Arc;

use crate::random::RandomSource;

/// 候选 UA 池。
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

#[derive(Clone)]
pub struct UserAgentRotator {
    rng: Arc<RandomSource>,
}

impl UserAgentRotator {
    pub fn new(rng: Arc<RandomSource>) -> Self {
        Self { rng }
    }

    /// 随机返回一个 UA。
    pub fn next(&self) -> &'static str {
        self.rng.choose(USER_AGENTS).copied().unwrap_or(USER_AGENTS[0])
    }
}
