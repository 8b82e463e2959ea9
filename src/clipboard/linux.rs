//! Linux：通过 `xclip` 写入 PNG。

use std::ffi::OsStr;
use std::path::PathBuf;

use super::staging::{run_command, stage_png};
use super::{ClipboardError, ImageClipboardWriter};
use crate::image_fetcher::Bitmap;

/// 以 `xclip -selection clipboard -t image/png -i <file>` 写入剪贴板。
#[derive(Debug, Clone)]
pub struct XclipClipboardWriter {
    program: String,
    temp_dir: Option<PathBuf>,
}

impl Default for XclipClipboardWriter {
    fn default() -> Self {
        Self {
            program: "xclip".to_string(),
            temp_dir: None,
        }
    }
}

impl XclipClipboardWriter {
    /// 指定可执行文件与临时目录（测试用）。
    pub fn with_program(program: impl Into<String>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            temp_dir,
        }
    }
}

impl ImageClipboardWriter for XclipClipboardWriter {
    fn backend_name(&self) -> &'static str {
        "xclip"
    }

    fn write_image(&self, bitmap: &Bitmap) -> Result<(), ClipboardError> {
        let staged = stage_png(bitmap, self.temp_dir.as_deref())?;

        let args: [&OsStr; 6] = [
            OsStr::new("-selection"),
            OsStr::new("clipboard"),
            OsStr::new("-t"),
            OsStr::new("image/png"),
            OsStr::new("-i"),
            staged.path().as_os_str(),
        ];
        run_command(&self.program, args)?;

        log::info!("✅ 已通过 xclip 写入剪贴板 - {}x{}", bitmap.width(), bitmap.height());
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn bitmap() -> Bitmap {
        Bitmap::from(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255])))
    }

    fn dir_is_empty(path: &std::path::Path) -> bool {
        std::fs::read_dir(path).map(|mut it| it.next().is_none()).unwrap_or(false)
    }

    #[test]
    fn temp_file_removed_after_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = XclipClipboardWriter::with_program("true", Some(dir.path().to_path_buf()));

        writer.write_image(&bitmap()).expect("write should succeed");

        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn temp_file_removed_after_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = XclipClipboardWriter::with_program(
            "definitely-not-a-real-binary-xyz",
            Some(dir.path().to_path_buf()),
        );

        let result = writer.write_image(&bitmap());

        assert!(matches!(result, Err(ClipboardError::Command(_))));
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn write_returns_while_forked_selection_owner_keeps_running() {
        use std::os::unix::fs::PermissionsExt;

        let script_dir = tempfile::tempdir().expect("tempdir");
        let script = script_dir.path().join("fake-xclip");
        std::fs::write(&script, "#!/bin/sh\n( sleep 3 ) &\nexit 0\n").expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let staging = tempfile::tempdir().expect("tempdir");
        let writer = XclipClipboardWriter::with_program(
            script.to_string_lossy().into_owned(),
            Some(staging.path().to_path_buf()),
        );

        let started = std::time::Instant::now();
        writer.write_image(&bitmap()).expect("write should succeed");

        assert!(
            started.elapsed() < std::time::Duration::from_secs(2),
            "write_image blocked for {:?}",
            started.elapsed()
        );
        assert!(dir_is_empty(staging.path()));
    }
}
