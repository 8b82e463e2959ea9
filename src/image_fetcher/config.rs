//! # 下载配置
//!
//! 覆盖下载、解码、放大三个阶段的可调参数。`Default` 即生产配置。

use image::imageops::FilterType;

/// 输出位图宽、高的下限；`min_dimension` 只能调高，不能低于此值。
pub const MIN_DIMENSION_FLOOR: u32 = 512;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 下载时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时（秒）。
    pub connect_timeout: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问本地或内网地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 解码前后、放大目标的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 输出位图宽、高的最小值。
    pub min_dimension: u32,
    /// 放大滤镜。
    pub resize_filter: FilterType,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 10,
            connect_timeout: 5,
            max_redirects: 5,
            allow_private_network: false,
            max_decoded_pixels: 40_000_000,
            min_dimension: MIN_DIMENSION_FLOOR,
            resize_filter: FilterType::Lanczos3,
        }
    }
}
