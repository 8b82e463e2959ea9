//! # 剪贴板图片搜索：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  主线程：hotkey（注册 Ctrl+Delete + 平台事件循环）        │
//! │       │                                                  │
//! │       ↓ hotkey-bridge 线程：TriggerSender::notify         │
//! │  trigger（容量 1 的通道，满则丢弃新按键）                 │
//! │       ↓                                                  │
//! │  tokio worker：TriggerHandler                            │
//! │  │                                                       │
//! │  ├─ clipboard::ClipboardTextSource   读文本 (arboard)     │
//! │  ├─ query::QueryEnhancer             trim + 随机后缀      │
//! │  ├─ search::ProviderOrchestrator     随机顺序 + 早停      │
//! │  │   ├─ Pixabay / Unsplash           JSON API             │
//! │  │   └─ Bing                         HTML 抓取 (scraper)  │
//! │  ├─ search::Selector                 等概率选一个 URL     │
//! │  ├─ image_fetcher::ImageFetcher      下载·校验·放大       │
//! │  └─ clipboard::ImageClipboardWriter  Win32 / osascript / xclip │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 启动阶段错误 `AppError` |
//! | [`config`] | 默认配置 + 环境变量覆盖 + 范围校验 |
//! | [`random`] | 可注入种子的共享随机源 |
//! | [`user_agent`] | 浏览器 UA 随机轮换 |
//! | [`query`] | 查询文本校验与增强 |
//! | [`net`] | HTTP 客户端构建、URL 日志脱敏 |
//! | [`search`] | 三个提供商适配器、编排器、选择器 |
//! | [`image_fetcher`] | 候选图片下载、解码、最小边长放大 |
//! | [`clipboard`] | 剪贴板文本读取与平台相关的图片写入 |
//! | [`trigger`] | 触发事件通道、单 worker、完整流程编排 |
//! | [`hotkey`] | 全局快捷键注册、事件桥接、平台事件循环 |

pub mod clipboard;
pub mod config;
pub mod error;
pub mod hotkey;
pub mod image_fetcher;
pub mod net;
pub mod query;
pub mod random;
pub mod search;
pub mod trigger;
pub mod user_agent;
