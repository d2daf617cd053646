use super::timestamp_sampler::TimeStamp;
use anyhow::{Result, bail};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// 單一片段的擷取資訊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub start_time: TimeStamp,
    /// 秒
    pub duration: u32,
    /// 處理高度（px）
    pub height: u32,
    /// 取樣順序，也是唯一的重組依據
    pub index: usize,
}

/// 送給 worker 的工作單位
///
/// 只包含純資料，不帶任何閉包或共享狀態，可序列化後跨行程傳遞
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipTask {
    pub metadata: ClipMetadata,
    pub video_path: PathBuf,
    pub processing_fps: u32,
    pub temp_output_path: PathBuf,
}

/// 已解碼的片段
///
/// 影格以 `Arc` 共享，複製（例如透明填充格）不會複製像素資料。
/// 所有影格尺寸一致。
#[derive(Debug, Clone)]
pub struct Clip {
    frames: Arc<Vec<RgbaImage>>,
    fps: u32,
    opacity: f32,
}

impl Clip {
    pub fn new(frames: Vec<RgbaImage>, fps: u32) -> Result<Self> {
        if fps == 0 {
            bail!("片段幀率必須大於 0");
        }
        let Some(first) = frames.first() else {
            bail!("片段沒有任何影格");
        };
        let size = first.dimensions();
        if size.0 == 0 || size.1 == 0 {
            bail!("影格尺寸無效: {}x{}", size.0, size.1);
        }
        if let Some(bad) = frames.iter().position(|f| f.dimensions() != size) {
            bail!(
                "第 {bad} 個影格尺寸 {:?} 與第一個影格 {:?} 不一致",
                frames[bad].dimensions(),
                size
            );
        }

        Ok(Self {
            frames: Arc::new(frames),
            fps,
            opacity: 1.0,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.frames[0].width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.frames[0].height()
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.frames[0].dimensions()
    }

    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.frames.len() as f64 / f64::from(self.fps)
    }

    #[must_use]
    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    /// 超出範圍時停在最後一格
    #[must_use]
    pub fn frame(&self, index: usize) -> &RgbaImage {
        &self.frames[index.min(self.frames.len() - 1)]
    }

    /// 共享影格、只改變不透明度的複本
    #[must_use]
    pub fn with_opacity(&self, opacity: f32) -> Self {
        Self {
            frames: Arc::clone(&self.frames),
            fps: self.fps,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn transparent_copy(&self) -> Self {
        self.with_opacity(0.0)
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }

    #[must_use]
    pub fn shares_frames_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }

    /// 釋放片段；之後不得再使用
    pub fn close(self) {}
}
