//! # 全局快捷键模块
//!
//! ## 设计思路
//!
//! 快捷键只负责“发出一个无负载的触发信号”：
//! - `HotkeyRegistration` 在主线程注册 `Ctrl+Delete`，持有期间保持有效
//! - 桥接线程从 `global-hotkey` 的全局事件通道读取按键，过滤后调用 `TriggerSender::notify`
//! - 主线程运行平台事件循环（Windows 消息循环 / macOS `NSApplication`），
//!   Linux 的 X11 监听由 `global-hotkey` 内部线程完成，主线程只需挂起
//!
//! ## 实现思路
//!
//! 只响应 `Pressed`，忽略 `Released`，避免一次按键触发两次。

use std::thread::JoinHandle;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::error::AppError;
use crate::trigger::TriggerSender;

/// 默认快捷键的显示文本。
pub const DEFAULT_CHORD_LABEL: &str = "Ctrl+Delete";

/// 默认快捷键。
pub fn default_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL), Code::Delete)
}

/// 已注册的全局快捷键；drop 时注销。
pub struct HotkeyRegistration {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl HotkeyRegistration {
    /// 注册快捷键。macOS / Windows 上必须在主线程调用。
    pub fn register(hotkey: HotKey) -> Result<Self, AppError> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| AppError::Hotkey(format!("无法创建快捷键管理器：{}", e)))?;
        manager
            .register(hotkey)
            .map_err(|e| AppError::Hotkey(format!("注册 {} 失败（可能已被占用）：{}", DEFAULT_CHORD_LABEL, e)))?;

        log::info!("⌨️ 已注册全局快捷键：{}", DEFAULT_CHORD_LABEL);
        Ok(Self { manager, hotkey })
    }

    pub fn id(&self) -> u32 {
        self.hotkey.id()
    }
}

impl Drop for HotkeyRegistration {
    fn drop(&mut self) {
        if let Err(err) = self.manager.unregister(self.hotkey) {
            log::warn!("⚠️ 注销全局快捷键失败：{}", err);
        }
    }
}

/// 是否为目标快捷键的按下事件。
pub fn is_trigger_press(event_id: u32, state: HotKeyState, expected_id: u32) -> bool {
    event_id == expected_id && state == HotKeyState::Pressed
}

/// 启动桥接线程：把快捷键事件转成触发事件。
pub fn spawn_hotkey_bridge(hotkey_id: u32, sender: TriggerSender) -> Result<JoinHandle<()>, AppError> {
    let handle = std::thread::Builder::new()
        .name("hotkey-bridge".to_string())
        .spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if !is_trigger_press(event.id(), event.state(), hotkey_id) {
                    continue;
                }
                log::debug!("⌨️ 检测到 {} 按下", DEFAULT_CHORD_LABEL);
                sender.notify();
            }
            log::info!("🛑 快捷键事件通道已关闭");
        })?;

    Ok(handle)
}

/// 在当前（主）线程运行平台事件循环，直到进程退出。
#[cfg(target_os = "windows")]
pub fn run_event_loop() {
    use windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, GetMessageW, MSG, TranslateMessage};

    let mut msg = MSG::default();
    unsafe {
        // 0 表示 WM_QUIT，-1 表示出错
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    log::info!("🛑 消息循环已退出");
}

#[cfg(target_os = "macos")]
pub fn run_event_loop() {
    use cocoa::appkit::{NSApplication, NSApplicationActivationPolicy};
    use cocoa::base::nil;

    unsafe {
        let app = NSApplication::sharedApplication(nil);
        app.setActivationPolicy_(NSApplicationActivationPolicy::NSApplicationActivationPolicyAccessory);
        app.run();
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn run_event_loop() {
    loop {
        std::thread::park();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_matching_press_triggers() {
        let id = default_hotkey().id();

        assert!(is_trigger_press(id, HotKeyState::Pressed, id));
        assert!(!is_trigger_press(id, HotKeyState::Released, id));
        assert!(!is_trigger_press(id.wrapping_add(1), HotKeyState::Pressed, id));
    }

    #[test]
    fn default_hotkey_is_ctrl_delete() {
        let hotkey = default_hotkey();

        assert_eq!(hotkey.mods, Modifiers::CONTROL);
        assert_eq!(hotkey.key, Code::Delete);
        assert_eq!(hotkey.id(), HotKey::new(Some(Modifiers::CONTROL), Code::Delete).id());
    }
}
