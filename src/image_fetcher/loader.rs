//! # 下载与校验模块
//!
//! ## 设计思路
//!
//! 在“尽可能早”的阶段拒绝不合格输入，减少不必要的内存与 CPU 消耗：
//! 协议与主机安全 → HTTP 状态 → 声明体积 → 流式体积上限 → 文件签名。
//!
//! `Content-Type` 只记日志不做拒绝：不少 CDN 以 `application/octet-stream`
//! 返回真实图片，是否为图片由文件签名与解码决定。
//!
//! ## 实现思路
//!
//! - 客户端关闭自动重定向，由本模块逐跳处理，每一跳都重新做主机安全校验。
//! - 每次请求随机取一个浏览器 UA。
//! - 失败不重试：一次触发只尝试一个候选 URL。

use std::net::IpAddr;
use std::time::Duration;

use super::source::RawImageData;
use super::{FetchConfig, ImageError, ImageFetcher};
use crate::net::{redact_url_for_log, sanitize_error_message};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

impl ImageFetcher {
    pub(super) fn build_http_client(config: &FetchConfig) -> Result<reqwest::Client, ImageError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 下载候选 URL 的原始字节，并确认其为图片。
    pub(super) async fn download(&self, url: &str) -> Result<RawImageData, ImageError> {
        let source_hint = redact_url_for_log(url);
        log::info!("🌐 开始下载图片 - URL: {}", source_hint);

        validate_url_safety(url, &self.config)?;
        let bytes = self.download_following_redirects(url).await?;
        validate_image_signature(&bytes)?;

        log::debug!("✅ 下载完成 - {} bytes", bytes.len());
        Ok(RawImageData { bytes, source_hint })
    }

    async fn download_following_redirects(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let mut current_url = reqwest::Url::parse(url)
            .map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

        for redirect_count in 0..=self.config.max_redirects {
            let response = self
                .client
                .get(current_url.clone())
                .header(reqwest::header::USER_AGENT, self.user_agents.next())
                .header(reqwest::header::ACCEPT, IMAGE_ACCEPT)
                .send()
                .await
                .map_err(|e| map_reqwest_error(e, current_url.as_str(), &self.config))?;

            if response.status().is_redirection() {
                if redirect_count >= self.config.max_redirects {
                    return Err(ImageError::Network(format!(
                        "重定向次数超过限制（{}）",
                        self.config.max_redirects
                    )));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .ok_or_else(|| ImageError::Network("重定向响应缺少 Location 头".to_string()))?
                    .to_str()
                    .map_err(|e| ImageError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

                let next_url = current_url
                    .join(location)
                    .map_err(|e| ImageError::InvalidFormat(format!("重定向 URL 解析失败：{}", e)))?;

                validate_url_safety(next_url.as_str(), &self.config)?;

                log::debug!("↪️ 跳转到: {}", redact_url_for_log(next_url.as_str()));
                current_url = next_url;
                continue;
            }

            return self.read_body(response).await;
        }

        Err(ImageError::Network("下载流程异常结束".to_string()))
    }

    /// 校验响应头并以流式方式读取正文。
    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ImageError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status_message(status.as_u16())
            )));
        }

        if let Some(ct) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
        {
            if !is_image_content_type(ct) {
                log::debug!("📄 响应类型不是 image/*：{}，交由文件签名判断", ct);
            }
        }

        let max_file_size = self.config.max_file_size;
        let declared_len = response.content_length();
        if let Some(size) = declared_len {
            if size > max_file_size {
                return Err(ImageError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = declared_len
            .map(|len| len.min(max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;
        let mut response = response;

        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                ImageError::Timeout(format!("下载超时（{}秒）", self.config.download_timeout))
            } else {
                ImageError::Network(format!("下载失败：{}", e))
            }
        })? {
            total = total.saturating_add(chunk.len() as u64);
            if total > max_file_size {
                return Err(ImageError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(buffer)
    }
}

/// 校验 URL 安全性。
///
/// 默认阻止本地/内网目标，防止 SSRF 风险。
pub(super) fn validate_url_safety(url: &str, config: &FetchConfig) -> Result<(), ImageError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ImageError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
    }

    if config.allow_private_network {
        return Ok(());
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ImageError::InvalidFormat("URL 缺少主机地址".to_string()))?;

    if is_local_hostname(host) {
        return Err(ImageError::InvalidFormat(format!(
            "禁止访问本地网络地址：{}",
            host
        )));
    }

    // IPv6 字面量在 host_str 中带方括号
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if is_private_or_local_ip(ip) {
            return Err(ImageError::InvalidFormat(format!("禁止访问内网 IP：{}", ip)));
        }
    }

    Ok(())
}

fn is_local_hostname(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host.eq_ignore_ascii_case("localhost.")
        || host.ends_with(".local")
}

/// 判断 IP 是否属于本地/内网/链路本地等受限范围。
fn is_private_or_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            if v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || v4.is_multicast()
            {
                return true;
            }

            let octets = v4.octets();
            octets[0] == 0 || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
                || v6.is_multicast()
        }
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

fn map_reqwest_error(e: reqwest::Error, url: &str, config: &FetchConfig) -> ImageError {
    let err_msg = sanitize_error_message(&e.to_string(), url);

    if e.is_timeout() {
        ImageError::Timeout(format!("下载超时（{}秒）", config.download_timeout))
    } else if e.is_connect() {
        ImageError::Network(format!("无法连接：{}", err_msg))
    } else {
        ImageError::Network(format!("请求失败：{}", err_msg))
    }
}

fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

/// 通过文件签名（magic bytes）校验内容确为图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| ImageError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ImageError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_fetcher::fetcher::tests::{create_png_bytes, local_fetcher, serve_once};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn url_safety_blocks_private_targets_by_default() {
        let config = FetchConfig::default();

        for url in [
            "http://127.0.0.1/image.png",
            "https://localhost/image.png",
            "http://10.0.0.8/a.jpg",
            "http://192.168.1.1/a.jpg",
            "http://[::1]/a.jpg",
            "http://printer.local/a.jpg",
        ] {
            assert!(
                matches!(validate_url_safety(url, &config), Err(ImageError::InvalidFormat(_))),
                "{} should be rejected",
                url
            );
        }
    }

    #[test]
    fn url_safety_rejects_non_http_schemes() {
        let config = FetchConfig {
            allow_private_network: true,
            ..FetchConfig::default()
        };

        assert!(validate_url_safety("file:///etc/passwd", &config).is_err());
        assert!(validate_url_safety("ftp://example.com/a.png", &config).is_err());
    }

    #[test]
    fn url_safety_allows_public_and_opt_in_private_targets() {
        assert!(validate_url_safety("https://cdn.pixabay.com/photo/a.jpg", &FetchConfig::default()).is_ok());

        let config = FetchConfig {
            allow_private_network: true,
            ..FetchConfig::default()
        };
        assert!(validate_url_safety("http://127.0.0.1/image.png", &config).is_ok());
    }

    #[test]
    fn content_type_parser_accepts_image_with_params() {
        assert!(is_image_content_type("image/png; charset=utf-8"));
        assert!(is_image_content_type("IMAGE/JPEG"));
        assert!(!is_image_content_type("text/html; charset=utf-8"));
    }

    #[test]
    fn signature_check_rejects_html() {
        let result = validate_image_signature(b"<html><body>not an image</body></html>");
        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
        assert!(validate_image_signature(&create_png_bytes(2, 2)).is_ok());
    }

    #[tokio::test]
    async fn download_accepts_png_served_as_octet_stream() {
        let (url, server) = serve_once("200 OK", "application/octet-stream", create_png_bytes(800, 600));
        let fetcher = local_fetcher();

        let result = fetcher.download(&url).await;
        server.join().expect("server thread failed");

        let raw = result.expect("png body should be accepted");
        assert!(raw.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn download_rejects_html_body() {
        let (url, server) = serve_once("200 OK", "text/html", b"<html></html>".to_vec());
        let fetcher = local_fetcher();

        let result = fetcher.download(&url).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn download_rejects_oversized_body() {
        let (url, server) = serve_once("200 OK", "image/png", create_png_bytes(64, 64));
        let mut fetcher = local_fetcher();
        fetcher.config.max_file_size = 16;

        let result = fetcher.download(&url).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[tokio::test]
    async fn download_blocks_redirect_to_localhost() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let response = format!(
                "HTTP/1.1 302 Found\r\nLocation: http://localhost:{}/final.png\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                addr.port()
            );

            stream
                .write_all(response.as_bytes())
                .expect("write redirect response failed");
            stream.flush().expect("flush failed");
        });

        // 首跳直连 127.0.0.1，重定向目标在严格配置下必须被拒绝
        let mut fetcher = local_fetcher();
        fetcher.config = FetchConfig::default();
        let url = format!("http://127.0.0.1:{}/start.png", addr.port());

        let result = fetcher.download_following_redirects(&url).await;
        server.join().expect("server thread failed");

        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }
}
