//! macOS：PNG 临时文件 + `osascript`。

use std::path::{Path, PathBuf};

use super::staging::{run_command, stage_png};
use super::{ClipboardError, ImageClipboardWriter};
use crate::image_fetcher::Bitmap;

#[derive(Debug, Clone)]
pub struct OsascriptClipboardWriter {
    program: String,
    temp_dir: Option<PathBuf>,
}

impl Default for OsascriptClipboardWriter {
    fn default() -> Self {
        Self {
            program: "osascript".to_string(),
            temp_dir: None,
        }
    }
}

impl OsascriptClipboardWriter {
    /// 指定可执行文件与临时目录（测试用）。
    pub fn with_program(program: impl Into<String>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            temp_dir,
        }
    }
}

/// 生成把 PNG 文件读入剪贴板的 AppleScript。
///
/// 路径中的反斜杠与双引号需要转义。
fn clipboard_script(path: &Path) -> String {
    let escaped = path
        .to_string_lossy()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!(
        "set the clipboard to (read (POSIX file \"{}\") as «class PNGf»)",
        escaped
    )
}

impl ImageClipboardWriter for OsascriptClipboardWriter {
    fn backend_name(&self) -> &'static str {
        "osascript"
    }

    fn write_image(&self, bitmap: &Bitmap) -> Result<(), ClipboardError> {
        let staged = stage_png(bitmap, self.temp_dir.as_deref())?;
        let script = clipboard_script(staged.path());

        run_command(&self.program, ["-e", script.as_str()])?;

        log::info!("✅ 已通过 osascript 写入剪贴板 - {}x{}", bitmap.width(), bitmap.height());
        Ok(())
    }
}
