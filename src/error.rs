//! 统一错误类型模块
//!
//! # 设计思路
//!
//! `AppError` 只覆盖进程启动阶段（配置、快捷键注册、运行时构建、剪贴板初始化）。
//! 单次触发内的失败由 `trigger::TriggerError` 表达，并在 worker 内被吸收，
//! 不会上升为 `AppError`，保证进程不因某一次搜索失败而退出。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ClipboardError` 与 `std::io::Error` 提供 `From` 转换，`main` 中直接 `?`。

use crate::clipboard::ClipboardError;

/// 应用级错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 配置值非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 全局快捷键注册 / 监听失败
    #[error("快捷键错误: {0}")]
    Hotkey(String),

    /// 剪贴板后端初始化失败
    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    /// 异步运行时或 HTTP 客户端构建失败
    #[error("运行时错误: {0}")]
    Runtime(String),

    /// 文件系统 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}
