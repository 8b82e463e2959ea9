//! Windows 原生剪贴板写入
//!
//! # 实现思路
//!
//! PNG 编码、RGBA→ARGB 转换、垂直翻转全部在打开剪贴板之前完成，
//! 使 Open→Empty→Set→Close 窗口尽量短。同时写入：
//! - `PNG`：保留透明通道，现代应用优先读取
//! - `CF_DIBV5`：系统会据此合成 `CF_DIB`/`CF_BITMAP`，兼容老应用
//!
//! 剪贴板被其他进程占用时返回 `ClipboardError::Unavailable`，其余失败为 `Write`。

use std::mem::size_of;
use std::ptr::copy_nonoverlapping;

use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_BUSY, ERROR_CLIPBOARD_NOT_OPEN, GlobalFree, HANDLE,
};
use windows::Win32::Graphics::Gdi::{BI_BITFIELDS, BITMAPV5HEADER, LCS_GM_IMAGES};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, OpenClipboard, RegisterClipboardFormatW, SetClipboardData,
};
use windows::Win32::System::Memory::{GMEM_MOVEABLE, GlobalAlloc, GlobalLock, GlobalUnlock};
use windows::Win32::System::Ole::CF_DIBV5;

use super::{ClipboardError, ImageClipboardWriter};
use crate::image_fetcher::Bitmap;

/// sRGB 色彩空间标识（windows-rs 中没有定义）。
#[allow(non_upper_case_globals)]
const LCS_sRGB: u32 = 0x7352_4742;

#[derive(Debug, Default, Clone, Copy)]
pub struct Win32ClipboardWriter;

struct PreppedBuffers {
    png_bytes: Vec<u8>,
    dibv5_bytes: Vec<u8>,
}

impl ImageClipboardWriter for Win32ClipboardWriter {
    fn backend_name(&self) -> &'static str {
        "win32"
    }

    fn write_image(&self, bitmap: &Bitmap) -> Result<(), ClipboardError> {
        let prepped = prepare_buffers(bitmap)?;
        write_prepped(&prepped)?;

        log::info!("✅ 已写入剪贴板（PNG + CF_DIBV5）- {}x{}", bitmap.width(), bitmap.height());
        Ok(())
    }
}

fn prepare_buffers(bitmap: &Bitmap) -> Result<PreppedBuffers, ClipboardError> {
    let png_bytes = bitmap
        .encode_png()
        .map_err(|e| ClipboardError::Encode(format!("PNG 编码失败：{}", e)))?;
    let dibv5_bytes = build_dibv5(bitmap.width() as usize, bitmap.height() as usize, bitmap.rgba_bytes())?;

    Ok(PreppedBuffers {
        png_bytes,
        dibv5_bytes,
    })
}

fn write_prepped(prepped: &PreppedBuffers) -> Result<(), ClipboardError> {
    unsafe {
        OpenClipboard(None).map_err(|e| win32_failure("打开剪贴板", "N/A", &e))?;

        if let Err(e) = EmptyClipboard() {
            let _ = CloseClipboard();
            return Err(win32_failure("清空剪贴板", "N/A", &e));
        }

        if let Err(e) = set_raw_format("PNG", &prepped.png_bytes) {
            let _ = CloseClipboard();
            return Err(e);
        }

        if let Err(e) = set_global_data(CF_DIBV5.0 as u32, "CF_DIBV5", &prepped.dibv5_bytes) {
            let _ = CloseClipboard();
            return Err(e);
        }

        let _ = CloseClipboard();
    }

    Ok(())
}

/// 注册自定义剪贴板格式并设置数据。
unsafe fn set_raw_format(name: &str, data: &[u8]) -> Result<(), ClipboardError> {
    let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    let format_id = unsafe { RegisterClipboardFormatW(windows::core::PCWSTR(wide.as_ptr())) };
    if format_id == 0 {
        return Err(ClipboardError::Write(format!("注册格式 '{}' 失败", name)));
    }
    unsafe { set_global_data(format_id, name, data) }
}

/// 将字节写入全局内存并 SetClipboardData。
///
/// 成功后内存所有权归系统，失败时自行释放。
unsafe fn set_global_data(format_id: u32, format_name: &str, data: &[u8]) -> Result<(), ClipboardError> {
    unsafe {
        let hglobal = GlobalAlloc(GMEM_MOVEABLE, data.len())
            .map_err(|e| win32_failure("GlobalAlloc", format_name, &e))?;

        let ptr = GlobalLock(hglobal) as *mut u8;
        if ptr.is_null() {
            let _ = GlobalFree(Some(hglobal));
            return Err(ClipboardError::Write("GlobalLock 返回空指针".to_string()));
        }

        copy_nonoverlapping(data.as_ptr(), ptr, data.len());
        let _ = GlobalUnlock(hglobal);

        if let Err(e) = SetClipboardData(format_id, Some(HANDLE(hglobal.0))) {
            let _ = GlobalFree(Some(hglobal));
            return Err(win32_failure("SetClipboardData", format_name, &e));
        }
    }

    Ok(())
}

fn win32_failure(operation: &str, format_name: &str, err: &windows::core::Error) -> ClipboardError {
    let hr = err.code().0 as u32;
    let message = format!("{}（{}）失败：0x{:08X} {}", operation, format_name, hr, err);

    if is_clipboard_busy(hr) {
        ClipboardError::Unavailable(message)
    } else {
        ClipboardError::Write(message)
    }
}

/// `HRESULT_FROM_WIN32` 包装的占用类错误码。
fn is_clipboard_busy(hr: u32) -> bool {
    if hr & 0xFFFF_0000 != 0x8007_0000 {
        return false;
    }
    let code = hr & 0xFFFF;
    [ERROR_ACCESS_DENIED.0, ERROR_CLIPBOARD_NOT_OPEN.0, ERROR_BUSY.0].contains(&code)
}

/// 构建完整的 DIBv5 数据（header + 翻转后的 ARGB 像素）。
fn build_dibv5(width: usize, height: usize, rgba_bytes: &[u8]) -> Result<Vec<u8>, ClipboardError> {
    let header_size = size_of::<BITMAPV5HEADER>();
    let pixel_bytes = width * height * 4;

    if rgba_bytes.len() != pixel_bytes {
        return Err(ClipboardError::Encode(format!(
            "像素长度不匹配: 期望 {} 实际 {}",
            pixel_bytes,
            rgba_bytes.len()
        )));
    }

    let argb_flipped = rgba_to_argb_flipped(rgba_bytes, width);

    // 正的 height 表示 bottom-up
    let header = BITMAPV5HEADER {
        bV5Size: header_size as u32,
        bV5Width: width as i32,
        bV5Height: height as i32,
        bV5Planes: 1,
        bV5BitCount: 32,
        bV5Compression: BI_BITFIELDS,
        bV5SizeImage: pixel_bytes as u32,
        bV5XPelsPerMeter: 0,
        bV5YPelsPerMeter: 0,
        bV5ClrUsed: 0,
        bV5ClrImportant: 0,
        bV5RedMask: 0x00ff_0000,
        bV5GreenMask: 0x0000_ff00,
        bV5BlueMask: 0x0000_00ff,
        bV5AlphaMask: 0xff00_0000,
        bV5CSType: LCS_sRGB,
        bV5Endpoints: unsafe { std::mem::zeroed() },
        bV5GammaRed: 0,
        bV5GammaGreen: 0,
        bV5GammaBlue: 0,
        bV5Intent: LCS_GM_IMAGES as u32,
        bV5ProfileData: 0,
        bV5ProfileSize: 0,
        bV5Reserved: 0,
    };

    let mut buf = Vec::with_capacity(header_size + pixel_bytes);
    let header_bytes = unsafe { std::slice::from_raw_parts(&header as *const _ as *const u8, header_size) };
    buf.extend_from_slice(header_bytes);
    buf.extend_from_slice(&argb_flipped);

    Ok(buf)
}

/// RGBA → BGRA（小端 ARGB），行序倒置为 bottom-up。
fn rgba_to_argb_flipped(rgba: &[u8], width: usize) -> Vec<u8> {
    let row_bytes = width * 4;
    if row_bytes == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(rgba.len());
    for row in rgba.chunks_exact(row_bytes).rev() {
        for px in row.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }
    out
}
