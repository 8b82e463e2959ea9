//! 剪贴板边界模块
//!
//! # 设计思路
//!
//! 核心流程只依赖两个能力接口：
//! - **读文本**：`ClipboardTextSource::read_text`，由 `arboard` 实现
//! - **写图片**：`ImageClipboardWriter::write_image`，三个平台各有一个实现
//!
//! 启动时根据运行平台选定写入实现，此后不再分支。测试中用内存假实现替换两端。
//!
//! # 实现思路
//!
//! - Windows：原生 Win32 API 同时写入 `PNG` 与 `CF_DIBV5` 两种格式（`win32` 子模块）。
//! - macOS：PNG 写入临时文件，`osascript` 以 `«class PNGf»` 读入剪贴板（`macos` 子模块）。
//! - Linux：PNG 写入临时文件，交给 `xclip`（`linux` 子模块）。
//! - 临时文件由 `tempfile::NamedTempFile` 持有，成功或失败都会在离开作用域时删除。
//! - 所有方法都是阻塞调用，上层通过 `spawn_blocking` 调度。

mod linux;
mod macos;
mod staging;
#[cfg(target_os = "windows")]
mod win32;

use std::sync::Arc;

use crate::image_fetcher::Bitmap;

pub use linux::XclipClipboardWriter;
pub use macos::OsascriptClipboardWriter;

/// 剪贴板读写错误。
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("剪贴板不可用：{0}")]
    Unavailable(String),

    #[error("读取剪贴板失败：{0}")]
    Read(String),

    #[error("图片编码失败：{0}")]
    Encode(String),

    #[error("临时文件错误：{0}")]
    TempFile(String),

    #[error("外部命令失败：{0}")]
    Command(String),

    #[error("写入剪贴板失败：{0}")]
    Write(String),
}

/// 剪贴板文本来源。
pub trait ClipboardTextSource: Send + Sync {
    /// 读取当前剪贴板文本；没有文本时返回空字符串。
    fn read_text(&self) -> Result<String, ClipboardError>;
}

/// 剪贴板图片写入端。
pub trait ImageClipboardWriter: Send + Sync {
    /// 写入实现名称（用于日志）。
    fn backend_name(&self) -> &'static str;

    fn write_image(&self, bitmap: &Bitmap) -> Result<(), ClipboardError>;
}

/// 基于 `arboard` 的文本读取。
///
/// 每次读取都新建 `arboard::Clipboard`，不跨线程持有句柄。
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardTextSource;

impl ClipboardTextSource for ArboardTextSource {
    fn read_text(&self) -> Result<String, ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::Unavailable(format!("无法访问剪贴板：{}", e)))?;

        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => {
                log::debug!("📋 剪贴板中没有文本内容");
                Ok(String::new())
            }
            Err(e) => Err(ClipboardError::Read(e.to_string())),
        }
    }
}

/// 运行平台。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardPlatform {
    Windows,
    MacOs,
    Linux,
}

impl ClipboardPlatform {
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// 其他类 Unix 系统一律按 Linux 处理（依赖 `xclip`）。
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            _ => Self::Linux,
        }
    }
}

/// 为指定平台创建图片写入端。
pub fn image_writer_for(
    platform: ClipboardPlatform,
) -> Result<Arc<dyn ImageClipboardWriter>, ClipboardError> {
    let writer: Arc<dyn ImageClipboardWriter> = match platform {
        ClipboardPlatform::Windows => windows_writer()?,
        ClipboardPlatform::MacOs => Arc::new(OsascriptClipboardWriter::default()),
        ClipboardPlatform::Linux => Arc::new(XclipClipboardWriter::default()),
    };

    log::info!("📋 剪贴板写入实现：{}", writer.backend_name());
    Ok(writer)
}

#[cfg(target_os = "windows")]
fn windows_writer() -> Result<Arc<dyn ImageClipboardWriter>, ClipboardError> {
    Ok(Arc::new(win32::Win32ClipboardWriter))
}

#[cfg(not(target_os = "windows"))]
fn windows_writer() -> Result<Arc<dyn ImageClipboardWriter>, ClipboardError> {
    Err(ClipboardError::Unavailable(
        "Win32 剪贴板写入只能在 Windows 上使用".to_string(),
    ))
}
