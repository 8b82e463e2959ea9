//! # 错误模型模块
//!
//! 使用单一错误枚举承载下载链路中的所有错误来源。
//! `ImageFetcher::fetch` 在边界处把它记录为日志并转换为 `None`。

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}
