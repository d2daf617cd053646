use crate::error::{ThumbnailError, ThumbnailResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const MAX_RECENT_PATHS: usize = 10;

/// 輸出 GIF 幀率上限
pub const MAX_OUTPUT_FPS: u32 = 60;

/// 網格單邊格數上限
pub const MAX_GRID_DIMENSION: u32 = 20;

/// 片段處理參數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingConfig {
    /// `None` 代表依照可用的邏輯核心數自動決定
    pub max_workers: Option<usize>,
    pub processing_fps: u32,
    pub processing_height: u32,
    pub enable_parallel: bool,
}

/// gifsicle 壓縮參數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionConfig {
    /// 0-200
    pub lossy_level: u32,
    /// 1-3
    pub optimization_level: u8,
    /// 2-256
    pub max_colors: u32,
    pub careful_optimization: bool,
}

/// 單次執行的完整設定，建立後不再修改；覆寫一律產生新值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub video_path: PathBuf,
    pub clip_duration: u32,
    pub interval: u32,
    pub fps: u32,
    pub cols: u32,
    pub rows: u32,
    pub grid_padding: u32,
    pub output_path: PathBuf,
    pub compressed_output_path: PathBuf,
    pub processing: ProcessingConfig,
    pub compression: CompressionConfig,
    pub include_metadata: bool,
    /// 壓縮成功後仍保留未壓縮的輸出
    pub keep_uncompressed: bool,
}

impl Config {
    /// 網格格數，同時也是取樣數量上限
    #[must_use]
    pub const fn grid_size(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// 壓縮輸出與原始輸出相同路徑時視為不壓縮
    #[must_use]
    pub fn compression_enabled(&self) -> bool {
        self.compressed_output_path != self.output_path
    }

    #[must_use]
    pub fn with_output_paths(mut self, output: &Path, compressed: &Path) -> Self {
        self.output_path = output.to_path_buf();
        self.compressed_output_path = compressed.to_path_buf();
        self
    }

    #[must_use]
    pub fn with_grid(mut self, cols: u32, rows: u32) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    #[must_use]
    pub const fn with_timing(mut self, clip_duration: u32, interval: u32, fps: u32) -> Self {
        self.clip_duration = clip_duration;
        self.interval = interval;
        self.fps = fps;
        self
    }

    #[must_use]
    pub fn with_processing(mut self, processing: ProcessingConfig) -> Self {
        self.processing = processing;
        self
    }

    #[must_use]
    pub const fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub const fn with_include_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }

    #[must_use]
    pub const fn with_keep_uncompressed(mut self, keep_uncompressed: bool) -> Self {
        self.keep_uncompressed = keep_uncompressed;
        self
    }

    #[must_use]
    pub fn without_compression(mut self) -> Self {
        self.compressed_output_path = self.output_path.clone();
        self
    }

    /// 在任何處理開始前檢查所有不變量
    pub fn validate(&self) -> ThumbnailResult<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(ThumbnailError::invalid_config(format!(
                "網格欄列數必須大於 0 (cols={}, rows={})",
                self.cols, self.rows
            )));
        }
        if self.cols > MAX_GRID_DIMENSION || self.rows > MAX_GRID_DIMENSION {
            return Err(ThumbnailError::invalid_config(format!(
                "網格欄列數不可超過 {MAX_GRID_DIMENSION} (cols={}, rows={})",
                self.cols, self.rows
            )));
        }
        if self.clip_duration == 0 {
            return Err(ThumbnailError::invalid_config("片段長度必須大於 0"));
        }
        if self.interval == 0 {
            return Err(ThumbnailError::invalid_config("取樣間隔必須大於 0"));
        }
        if self.fps == 0 || self.fps > MAX_OUTPUT_FPS {
            return Err(ThumbnailError::invalid_config(format!(
                "輸出幀率必須介於 1 到 {MAX_OUTPUT_FPS} (目前 {})",
                self.fps
            )));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ThumbnailError::invalid_config("未指定輸出路徑"));
        }
        self.processing.validate()?;
        self.compression.validate()
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> ThumbnailResult<()> {
        if self.max_workers == Some(0) {
            return Err(ThumbnailError::invalid_config("worker 數量必須大於 0"));
        }
        if self.processing_fps == 0 || self.processing_fps > MAX_OUTPUT_FPS {
            return Err(ThumbnailError::invalid_config(format!(
                "處理幀率必須介於 1 到 {MAX_OUTPUT_FPS} (目前 {})",
                self.processing_fps
            )));
        }
        if self.processing_height == 0 {
            return Err(ThumbnailError::invalid_config("處理高度必須大於 0"));
        }
        Ok(())
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> ThumbnailResult<()> {
        if self.lossy_level > 200 {
            return Err(ThumbnailError::invalid_config(format!(
                "lossy 等級必須介於 0 到 200 (目前 {})",
                self.lossy_level
            )));
        }
        if !(1..=3).contains(&self.optimization_level) {
            return Err(ThumbnailError::invalid_config(format!(
                "最佳化等級必須介於 1 到 3 (目前 {})",
                self.optimization_level
            )));
        }
        if !(2..=256).contains(&self.max_colors) {
            return Err(ThumbnailError::invalid_config(format!(
                "色彩數必須介於 2 到 256 (目前 {})",
                self.max_colors
            )));
        }
        Ok(())
    }
}

/// 解析 `COLSxROWS` 格式的網格，例如 `3x5`、`4X3`
pub fn parse_grid(input: &str) -> ThumbnailResult<(u32, u32)> {
    let normalized = input.trim().to_lowercase();
    let parsed = normalized
        .split_once('x')
        .and_then(|(cols, rows)| Some((cols.trim().parse().ok()?, rows.trim().parse().ok()?)));

    match parsed {
        Some((cols, rows)) if cols > 0 && rows > 0 => Ok((cols, rows)),
        _ => Err(ThumbnailError::invalid_config(format!(
            "網格格式錯誤: {input}，請使用 3x5 或 4x3 這類格式"
        ))),
    }
}

/// 預設組合
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Default,
    Fast,
    Quality,
}

impl Preset {
    pub const ALL: [Self; 3] = [Self::Default, Self::Fast, Self::Quality];

    #[must_use]
    pub const fn output_suffix(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Fast => "_fast",
            Self::Quality => "_quality",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "標準 (3x5, 40 秒間隔)"),
            Self::Fast => write!(f, "快速 (較低解析度)"),
            Self::Quality => write!(f, "高品質 (4x6, 30 秒間隔)"),
        }
    }
}

/// 使用者設定，儲存在 settings.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub preset: Preset,
    pub include_metadata: bool,
    pub enable_parallel: bool,
    pub max_workers: Option<usize>,
    pub compress_output: bool,
    pub keep_uncompressed: bool,
    pub continue_on_error: bool,
    pub recent_paths: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            preset: Preset::Default,
            include_metadata: true,
            enable_parallel: true,
            max_workers: None,
            compress_output: true,
            keep_uncompressed: false,
            continue_on_error: true,
            recent_paths: Vec::new(),
        }
    }
}
