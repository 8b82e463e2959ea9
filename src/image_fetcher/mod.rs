//! # 图片下载与规范化模块（image_fetcher）
//!
//! ## 设计思路
//!
//! 将“候选 URL → 原始字节 → 位图 → 尺寸规范化”按职责拆分为多个子模块：
//!
//! - `fetcher`：`ImageFetcher` 本体，编排整条流程并记录阶段耗时
//! - `loader`：URL 安全校验、下载、内容类型/体积/签名校验
//! - `pipeline`：解码、像素上限、最小边长放大
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! CandidateUrl
//!    ↓
//! fetcher.rs（fetch：失败只记日志，返回 None）
//!    ├─ loader.rs（URL 校验 + 随机 UA 下载 + 签名校验）
//!    └─ pipeline.rs（解码 + 像素限制 + 不足 512 时 Lanczos 放大）
//!    ↓
//! Bitmap（宽、高均 ≥ 最小边长）
//! ```

mod config;
mod error;
mod fetcher;
mod loader;
mod pipeline;
mod source;

pub use config::{FetchConfig, MIN_DIMENSION_FLOOR};
pub use error::ImageError;
pub use fetcher::ImageFetcher;
pub use pipeline::upscale_target;
pub use source::Bitmap;
