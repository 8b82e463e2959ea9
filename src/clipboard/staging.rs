//! 临时文件中转：供依赖外部命令的写入实现共用。

use std::ffi::OsStr;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;

use super::ClipboardError;
use crate::image_fetcher::Bitmap;

/// 把位图编码为 PNG 写入临时文件。
///
/// 返回的 `NamedTempFile` 在 drop 时删除磁盘文件。
pub(super) fn stage_png(bitmap: &Bitmap, temp_dir: Option<&Path>) -> Result<NamedTempFile, ClipboardError> {
    let png = bitmap
        .encode_png()
        .map_err(|e| ClipboardError::Encode(e.to_string()))?;

    let mut builder = tempfile::Builder::new();
    builder.prefix("clip-image-").suffix(".png");
    let mut file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ClipboardError::TempFile(format!("无法创建临时文件：{}", e)))?;

    file.write_all(&png)
        .and_then(|_| file.flush())
        .map_err(|e| ClipboardError::TempFile(format!("写入临时文件失败：{}", e)))?;

    log::debug!("💾 PNG 已写入临时文件 - {} bytes", png.len());
    Ok(file)
}

/// 执行外部命令并等待其退出；非零退出码视为失败。
///
/// xclip 会 fork 出常驻子进程持有剪贴板，子进程继承父进程的标准输出/错误。
/// 因此不能用管道收集输出：标准输入输出接到 null，标准错误写进临时文件，
/// 只等待直接子进程退出。
pub(super) fn run_command<I, S>(program: &str, args: I) -> Result<(), ClipboardError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut stderr_file =
        tempfile::tempfile().map_err(|e| ClipboardError::TempFile(format!("无法创建临时文件：{}", e)))?;
    let stderr_handle = stderr_file
        .try_clone()
        .map_err(|e| ClipboardError::TempFile(format!("无法复制文件句柄：{}", e)))?;

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr_handle))
        .status()
        .map_err(|e| ClipboardError::Command(format!("无法启动 {}：{}", program, e)))?;

    if !status.success() {
        let mut stderr = String::new();
        let _ = stderr_file
            .seek(SeekFrom::Start(0))
            .and_then(|_| stderr_file.read_to_string(&mut stderr));
        return Err(ClipboardError::Command(format!(
            "{} 退出码 {:?}：{}",
            program,
            status.code(),
            stderr.trim()
        )));
    }

    Ok(())
}
