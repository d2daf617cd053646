use anyhow::{Result, bail};
use std::path::Path;

/// 支援的影片副檔名（小寫、含點）
pub const VIDEO_EXTENSIONS: [&str; 21] = [
    ".mp4", ".avi", ".mov", ".mkv", ".wmv", ".flv", ".webm", ".m4v", ".3gp", ".ogv", ".ts",
    ".mts", ".m2ts", ".mpg", ".mpeg", ".m2v", ".vob", ".asf", ".rm", ".rmvb", ".dv",
];

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[must_use]
pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&format!(".{}", ext.to_lowercase()).as_str()))
}

/// 確認檔案存在、是一般檔案、副檔名為影片且非空
pub fn validate_video_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("檔案不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("不是檔案: {}", path.display());
    }
    if !has_video_extension(path) {
        bail!("不是支援的影片格式: {}", path.display());
    }
    if std::fs::metadata(path)?.len() == 0 {
        bail!("檔案大小為 0: {}", path.display());
    }
    Ok(())
}
