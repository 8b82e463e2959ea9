//! # 剪贴板图片搜索：应用入口
//!
//! 本文件只负责初始化与生命周期：日志、配置、运行时、worker、快捷键、Ctrl+C。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::sync::Arc;

use clipboard_image_search::clipboard::{self, ArboardTextSource, ClipboardPlatform};
use clipboard_image_search::config::AppConfig;
use clipboard_image_search::error::AppError;
use clipboard_image_search::hotkey::{self, DEFAULT_CHORD_LABEL, HotkeyRegistration};
use clipboard_image_search::random::RandomSource;
use clipboard_image_search::trigger::{self, TriggerHandler};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("❌ 启动失败：{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    log::info!("🖼️ 剪贴板图片搜索 v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env()?;
    log::info!("⚙️ 配置已加载 - {}", config.credentials_summary());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("clip-search-worker")
        .build()
        .map_err(|e| AppError::Runtime(format!("无法创建 tokio 运行时：{}", e)))?;

    let sink = clipboard::image_writer_for(ClipboardPlatform::detect())?;
    let handler = TriggerHandler::from_config(
        &config,
        Arc::new(RandomSource::from_entropy()),
        Arc::new(ArboardTextSource),
        sink,
    )?;

    let (sender, receiver) = trigger::trigger_channel();
    runtime.spawn(trigger::run_trigger_worker(Arc::new(handler), receiver));
    runtime.spawn(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("👋 收到 Ctrl+C，程序已退出");
                std::process::exit(0);
            }
            Err(err) => log::warn!("⚠️ 无法监听 Ctrl+C：{}", err),
        }
    });

    let registration = HotkeyRegistration::register(hotkey::default_hotkey())?;
    hotkey::spawn_hotkey_bridge(registration.id(), sender)?;

    log::info!(
        "✅ 就绪：复制一段文字，然后按 {} 搜索图片并写入剪贴板（Ctrl+C 退出）",
        DEFAULT_CHORD_LABEL
    );

    hotkey::run_event_loop();

    drop(registration);
    runtime.shutdown_background();
    Ok(())
}
