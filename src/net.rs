//! HTTP 公共工具：客户端构建与日志脱敏。

use std::time::Duration;

/// 构建提供商共用的 HTTP 客户端。
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// 日志中只保留 `scheme://host[:port]/path`，去掉查询串（可能含 API Key）。
pub fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let path = parsed.path();

    format!("{}://{}{}{}", parsed.scheme(), host, port, path)
}

/// 把错误信息中的完整 URL 替换为脱敏版本。
pub fn sanitize_error_message(error_msg: &str, url: &str) -> String {
    error_msg.replace(url, &redact_url_for_log(url))
}
