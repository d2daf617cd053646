//! 單一影片的完整流程
//!
//! 設定檢查 → 探測 → 取樣 → 平行擷取 → 補足網格 → 合成 → 資訊列 → 輸出 → 壓縮

use super::clip_extractor::extract_clips;
use super::gifsicle::{CompressionReport, GifsicleCompressor};
use super::grid_layout::{compose_grid, pad_clips_to_grid_size};
use super::media_backend::MediaBackend;
use super::metadata_header::combine_metadata_with_grid;
use super::timestamp_sampler::{create_clip_metadata, sample_timestamps};
use crate::config::Config;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::tools::ensure_directory_exists;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub clip_count: usize,
    pub degraded_count: usize,
    pub dropped_count: usize,
    /// 最終動畫的像素尺寸
    pub output_size: (u32, u32),
    pub final_output: PathBuf,
    pub compression: Option<CompressionReport>,
    pub elapsed: Duration,
}

fn ensure_parent_exists(path: &Path) -> ThumbnailResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory_exists(parent)?;
    }
    Ok(())
}

pub fn create_video_thumbnail(
    config: &Config,
    backend: &dyn MediaBackend,
    shutdown_signal: &AtomicBool,
) -> ThumbnailResult<PipelineReport> {
    create_video_thumbnail_with(config, backend, &GifsicleCompressor::new(), shutdown_signal)
}

/// 壓縮失敗時保留原始輸出並回傳錯誤
pub fn create_video_thumbnail_with(
    config: &Config,
    backend: &dyn MediaBackend,
    compressor: &GifsicleCompressor,
    shutdown_signal: &AtomicBool,
) -> ThumbnailResult<PipelineReport> {
    let started = Instant::now();

    config.validate()?;
    if !config.video_path.is_file() {
        return Err(ThumbnailError::VideoNotFound(config.video_path.clone()));
    }

    info!("處理影片: {}", config.video_path.display());
    let video_info = backend.probe(&config.video_path)?;
    info!(
        "影片長度 {:.1} 秒, {}x{}",
        video_info.duration_seconds, video_info.width, video_info.height
    );

    let metadata = if config.include_metadata {
        match backend.probe_metadata(&config.video_path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("無法取得影片資訊，略過資訊列: {e:#}");
                None
            }
        }
    } else {
        None
    };

    let timestamps = sample_timestamps(
        video_info.duration_seconds,
        config.clip_duration,
        config.interval,
        config.grid_size(),
    );
    if timestamps.is_empty() {
        return Err(ThumbnailError::invalid_config(format!(
            "影片長度 {:.1} 秒不足以擷取 {} 秒的片段",
            video_info.duration_seconds, config.clip_duration
        )));
    }

    let metadatas = create_clip_metadata(&timestamps, config);
    info!("產生 {} 個片段待處理", metadatas.len());

    let extract_started = Instant::now();
    let extraction = extract_clips(
        &config.video_path,
        &metadatas,
        &config.processing,
        backend,
        shutdown_signal,
    )?;
    info!(
        "片段處理完成，耗時 {:.1} 秒 (成功 {}, 降級 {}, 捨棄 {})",
        extract_started.elapsed().as_secs_f64(),
        extraction.clips.len(),
        extraction.degraded_count(),
        extraction.dropped.len()
    );

    if extraction.is_empty() {
        return Err(ThumbnailError::NoClipsProduced);
    }

    let clip_count = extraction.clips.len();
    let degraded_count = extraction.degraded_count();
    let dropped_count = extraction.dropped.len();

    info!("排列網格 {}x{}", config.cols, config.rows);
    let padded = pad_clips_to_grid_size(extraction.into_clips(), config.grid_size())?;
    let grid = compose_grid(padded, config.cols, config.rows, config.grid_padding)?;

    let final_clip = match &metadata {
        Some(metadata) => {
            info!("加上影片資訊列");
            combine_metadata_with_grid(metadata, grid)?
        }
        None => grid,
    };
    let output_size = final_clip.size();

    ensure_parent_exists(&config.output_path)?;
    backend.render_output(&final_clip, config.fps, &config.output_path)?;
    final_clip.close();
    info!("已輸出: {}", config.output_path.display());

    let (final_output, compression) = if config.compression_enabled() {
        ensure_parent_exists(&config.compressed_output_path)?;
        info!("開始壓縮");
        let report = compressor.compress(
            &config.output_path,
            &config.compressed_output_path,
            &config.compression,
        )?;

        if config.keep_uncompressed {
            info!("保留未壓縮的輸出: {}", config.output_path.display());
        } else if let Err(e) = fs::remove_file(&config.output_path) {
            warn!(
                "無法刪除未壓縮的輸出 {}: {}",
                config.output_path.display(),
                e
            );
        } else {
            info!("已刪除未壓縮的輸出: {}", config.output_path.display());
        }

        (config.compressed_output_path.clone(), report)
    } else {
        (config.output_path.clone(), None)
    };

    let elapsed = started.elapsed();
    info!(
        "完成，總耗時 {:.1} 秒，輸出: {}",
        elapsed.as_secs_f64(),
        final_output.display()
    );

    Ok(PipelineReport {
        clip_count,
        degraded_count,
        dropped_count,
        output_size,
        final_output,
        compression,
        elapsed,
    })
}
