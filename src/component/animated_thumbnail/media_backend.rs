//! 媒體處理協作者
//!
//! `MediaBackend` 描述流程需要的能力：探測影片、擷取片段影格、
//! 讀寫中間檔以及輸出最終動畫。`FfmpegBackend` 以 ffprobe / ffmpeg
//! 子行程實作，每次擷取都啟動獨立的 ffmpeg，解碼器崩潰不會影響主程式。

use super::clip::{Clip, ClipMetadata};
use super::gif_io;
use crate::tools::{CompleteMetadata, VideoInfo, get_complete_metadata, get_video_info};
use anyhow::{Context, Result, bail};
use image::RgbaImage;
use log::{debug, warn};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// 擷取 `[start, start + duration)` 並重新取樣
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRequest {
    pub start_seconds: u64,
    pub duration_seconds: u32,
    pub height: u32,
    pub fps: u32,
}

impl SegmentRequest {
    #[must_use]
    pub const fn for_clip(metadata: &ClipMetadata, fps: u32) -> Self {
        Self {
            start_seconds: metadata.start_time.seconds,
            duration_seconds: metadata.duration,
            height: metadata.height,
            fps,
        }
    }
}

pub trait MediaBackend: Send + Sync {
    fn probe(&self, video_path: &Path) -> Result<VideoInfo>;

    fn probe_metadata(&self, video_path: &Path) -> Result<CompleteMetadata>;

    /// 回傳重新取樣後的 RGBA 影格
    fn extract_segment(&self, video_path: &Path, request: &SegmentRequest)
    -> Result<Vec<RgbaImage>>;

    /// 寫入中間檔
    fn write_clip(&self, frames: &[RgbaImage], fps: u32, path: &Path) -> Result<()> {
        gif_io::write_gif(frames, fps, path)
    }

    /// 讀回中間檔
    fn load_clip(&self, path: &Path, fps: u32) -> Result<Clip> {
        gif_io::read_gif(path, fps)
    }

    /// 以 `output_fps` 輸出最終動畫
    fn render_output(&self, clip: &Clip, output_fps: u32, path: &Path) -> Result<()> {
        gif_io::write_clip_resampled(clip, output_fps, path)
    }
}

/// 以處理高度等比例縮放後的寬度
#[must_use]
pub fn scaled_width(source_width: u32, source_height: u32, target_height: u32) -> u32 {
    if source_height == 0 {
        return target_height.max(1);
    }
    let width = f64::from(source_width) * f64::from(target_height) / f64::from(source_height);
    (width.round() as u32).max(1)
}

/// 切割 rawvideo RGBA 資料為影格，不完整的尾端捨棄
fn split_raw_frames(raw: &[u8], width: u32, height: u32) -> Vec<RgbaImage> {
    let frame_len = (width * height * 4) as usize;
    if frame_len == 0 {
        return Vec::new();
    }

    if raw.len() % frame_len != 0 {
        warn!(
            "rawvideo 資料長度 {} 不是影格大小 {} 的整數倍，捨棄尾端",
            raw.len(),
            frame_len
        );
    }

    raw.chunks_exact(frame_len)
        .filter_map(|chunk| RgbaImage::from_raw(width, height, chunk.to_vec()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    fn segment_args(video_path: &Path, request: &SegmentRequest, width: u32) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostdin".to_string(),
            "-ss".to_string(),
            request.start_seconds.to_string(),
            "-i".to_string(),
            video_path.to_string_lossy().to_string(),
            "-t".to_string(),
            request.duration_seconds.to_string(),
            "-an".to_string(),
            "-sn".to_string(),
            "-dn".to_string(),
            "-threads".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            format!("fps={},scale={}:{}", request.fps, width, request.height),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "pipe:1".to_string(),
        ]
    }

    fn render_args(clip: &Clip, output_fps: u32, output_path: &Path) -> Vec<String> {
        let (width, height) = clip.size();
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-s".to_string(),
            format!("{width}x{height}"),
            "-r".to_string(),
            clip.fps().to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-vf".to_string(),
            format!(
                "fps={output_fps},split[s0][s1];[s0]palettegen=stats_mode=diff[p];[s1][p]paletteuse=dither=bayer:bayer_scale=5"
            ),
            "-loop".to_string(),
            "0".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    /// ffmpeg 提早結束時，回報它的 stderr 而不是寫入管線的錯誤
    fn render_with(program: &str, clip: &Clip, output_fps: u32, path: &Path) -> Result<()> {
        let args = Self::render_args(clip, output_fps, path);
        debug!("輸出 GIF: {program} {}", args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("無法啟動 {program} 輸出 GIF"))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("無法開啟 ffmpeg stdin"))?;

        let mut write_error = None;
        for frame in clip.frames() {
            if let Err(e) = stdin.write_all(frame.as_raw()) {
                write_error = Some(e);
                break;
            }
        }
        // 關閉 stdin 讓 ffmpeg 結束輸入
        drop(stdin);

        let output = child
            .wait_with_output()
            .with_context(|| "等待 ffmpeg 結束失敗")?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if let Some(e) = write_error {
            if stderr.is_empty() {
                return Err(anyhow::Error::new(e).context("寫入影格到 ffmpeg 失敗"));
            }
            bail!("ffmpeg 輸出 GIF 失敗: {stderr}");
        }

        if !output.status.success() {
            bail!("ffmpeg 輸出 GIF 失敗: {stderr}");
        }

        if !path.exists() {
            bail!("GIF 未建立: {}", path.display());
        }

        Ok(())
    }
}

impl MediaBackend for FfmpegBackend {
    fn probe(&self, video_path: &Path) -> Result<VideoInfo> {
        get_video_info(video_path)
    }

    fn probe_metadata(&self, video_path: &Path) -> Result<CompleteMetadata> {
        get_complete_metadata(video_path)
    }

    fn extract_segment(
        &self,
        video_path: &Path,
        request: &SegmentRequest,
    ) -> Result<Vec<RgbaImage>> {
        let info = self.probe(video_path)?;
        let width = scaled_width(info.width, info.height, request.height);
        let args = Self::segment_args(video_path, request, width);

        debug!("擷取片段: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("無法執行 ffmpeg 擷取片段: {}", video_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg 擷取片段失敗: {}", stderr.trim());
        }

        let frames = split_raw_frames(&output.stdout, width, request.height);
        if frames.is_empty() {
            bail!(
                "ffmpeg 沒有輸出任何影格 (起點 {}s, 長度 {}s)",
                request.start_seconds,
                request.duration_seconds
            );
        }

        Ok(frames)
    }

    fn render_output(&self, clip: &Clip, output_fps: u32, path: &Path) -> Result<()> {
        Self::render_with("ffmpeg", clip, output_fps, path)
    }
}
