use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 單次執行的暫存目錄
///
/// 由主流程獨佔。離開作用域時刪除所有登記的暫存檔與目錄本身，
/// 刪除失敗只記錄警告。
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    tracked: Vec<PathBuf>,
}

impl ScratchDir {
    /// 建立在系統暫存目錄下
    pub fn create(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .context("無法建立暫存目錄")?;
        Ok(Self::from_dir(dir))
    }

    /// 建立在指定的上層目錄下
    pub fn create_in(parent: &Path, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .with_context(|| format!("無法在 {} 建立暫存目錄", parent.display()))?;
        Ok(Self::from_dir(dir))
    }

    fn from_dir(dir: TempDir) -> Self {
        debug!("建立暫存目錄: {}", dir.path().display());
        Self {
            dir: Some(dir),
            tracked: Vec::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.as_ref().map_or_else(|| Path::new(""), TempDir::path)
    }

    /// 登記一個暫存檔，清理時刪除
    pub fn track(&mut self, path: PathBuf) {
        self.tracked.push(path);
    }

    #[must_use]
    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// 立即清理，回傳成功刪除的檔案數
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.tracked.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("無法刪除暫存檔 {}: {}", path.display(), e),
            }
        }

        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("無法刪除暫存目錄 {}: {}", dir_path.display(), e);
            } else {
                debug!("已刪除暫存目錄: {}", dir_path.display());
            }
        }

        removed
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}
