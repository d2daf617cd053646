//! 動態縮圖流程的錯誤分類
//!
//! 只有這些錯誤會往上傳遞並中止執行；單一片段的擷取失敗在 worker 內部處理，
//! 不會出現在這裡。

use std::path::PathBuf;
use thiserror::Error;

pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("設定錯誤: {0}")]
    InvalidConfig(String),

    #[error("沒有成功產生任何片段")]
    NoClipsProduced,

    #[error("無法合成網格: 片段清單為空")]
    EmptyComposition,

    #[error("找不到 {tool}，請先安裝 {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} 執行失敗 (exit code {code:?}): {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("找不到影片檔案: {0}")]
    VideoNotFound(PathBuf),

    #[error("操作已取消")]
    Cancelled,

    #[error("媒體處理失敗: {0:#}")]
    Media(#[from] anyhow::Error),

    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),
}

impl ThumbnailError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// 是否為設定類錯誤（在任何處理開始前就能判定）
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::VideoNotFound(_))
    }
}
