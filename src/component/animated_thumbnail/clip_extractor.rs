//! 平行片段擷取
//!
//! 每個片段是一個獨立工作：擷取影格、加上時間標籤、寫入暫存 GIF。
//! 主要擷取失敗時改用降級片段（同一時間範圍，10% 不透明度疊在黑底上），
//! 兩者都失敗則該片段在重組時被捨棄。輸出順序一律依 `ClipMetadata.index`。

use super::annotation::{BitmapFont, annotate_frame, fade_frame, frame_label};
use super::clip::{Clip, ClipMetadata, ClipTask};
use super::media_backend::{MediaBackend, SegmentRequest};
use super::scratch_dir::ScratchDir;
use crate::config::ProcessingConfig;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::tools::logical_core_count;
use anyhow::{Result, anyhow};
use console::style;
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// 降級片段的不透明度
pub const FALLBACK_OPACITY: f32 = 0.1;

/// 單一工作的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    Completed(PathBuf),
    Degraded(PathBuf),
    Failed(PathBuf),
}

impl ClipOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Completed(path) | Self::Degraded(path) | Self::Failed(path) => path,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub index: usize,
    pub outcome: ClipOutcome,
}

#[derive(Debug, Clone)]
pub struct ExtractedClip {
    pub index: usize,
    pub clip: Clip,
    pub degraded: bool,
}

/// 依 index 排序的片段，以及被捨棄的 index
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub clips: Vec<ExtractedClip>,
    pub dropped: Vec<usize>,
}

impl ExtractionResult {
    #[must_use]
    pub fn degraded_count(&self) -> usize {
        self.clips.iter().filter(|c| c.degraded).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    #[must_use]
    pub fn into_clips(self) -> Vec<Clip> {
        self.clips.into_iter().map(|c| c.clip).collect()
    }
}

/// worker 數量：`min(設定值或邏輯核心數, 片段數)`，至少 1
#[must_use]
pub fn resolve_worker_count(configured: Option<usize>, available: usize, clip_count: usize) -> usize {
    configured
        .unwrap_or(available)
        .min(clip_count)
        .max(1)
}

/// `clip_{index:03}_{uuid8}.gif`
#[must_use]
pub fn temp_clip_filename(dir: &Path, index: usize) -> PathBuf {
    let id = Uuid::new_v4().simple().to_string();
    dir.join(format!("clip_{index:03}_{}.gif", &id[..8]))
}

#[must_use]
pub fn create_clip_tasks(
    video_path: &Path,
    metadatas: &[ClipMetadata],
    processing_fps: u32,
    temp_dir: &Path,
) -> Vec<ClipTask> {
    metadatas
        .iter()
        .map(|metadata| ClipTask {
            metadata: metadata.clone(),
            video_path: video_path.to_path_buf(),
            processing_fps,
            temp_output_path: temp_clip_filename(temp_dir, metadata.index),
        })
        .collect()
}

/// 擷取並加上時間標籤
fn render_primary(
    backend: &dyn MediaBackend,
    video_path: &Path,
    metadata: &ClipMetadata,
    fps: u32,
) -> Result<Vec<RgbaImage>> {
    let frames = backend.extract_segment(video_path, &SegmentRequest::for_clip(metadata, fps))?;
    let font = BitmapFont::default();

    Ok(frames
        .iter()
        .enumerate()
        .map(|(i, frame)| annotate_frame(frame, &frame_label(metadata.start_time, i, fps), &font))
        .collect())
}

/// 降級片段：同一時間範圍，不加標籤
fn render_fallback(
    backend: &dyn MediaBackend,
    video_path: &Path,
    metadata: &ClipMetadata,
    fps: u32,
) -> Result<Vec<RgbaImage>> {
    let frames = backend.extract_segment(video_path, &SegmentRequest::for_clip(metadata, fps))?;
    Ok(frames
        .iter()
        .map(|frame| fade_frame(frame, FALLBACK_OPACITY))
        .collect())
}

/// 執行單一工作，錯誤在此處理完畢
#[must_use]
pub fn process_clip_task(task: &ClipTask, backend: &dyn MediaBackend) -> TaskResult {
    let metadata = &task.metadata;
    let path = &task.temp_output_path;

    let primary = render_primary(backend, &task.video_path, metadata, task.processing_fps)
        .and_then(|frames| backend.write_clip(&frames, task.processing_fps, path));

    let outcome = match primary {
        Ok(()) => {
            debug!("片段 {} 完成: {}", metadata.index, path.display());
            ClipOutcome::Completed(path.clone())
        }
        Err(primary_err) => {
            warn!(
                "片段 {} ({}) 擷取失敗，改用降級片段: {primary_err:#}",
                metadata.index, metadata.start_time
            );
            let fallback = render_fallback(backend, &task.video_path, metadata, task.processing_fps)
                .and_then(|frames| backend.write_clip(&frames, task.processing_fps, path));
            match fallback {
                Ok(()) => ClipOutcome::Degraded(path.clone()),
                Err(fallback_err) => {
                    error!(
                        "片段 {} 降級片段也失敗: {fallback_err:#}",
                        metadata.index
                    );
                    ClipOutcome::Failed(path.clone())
                }
            }
        }
    };

    TaskResult {
        index: metadata.index,
        outcome,
    }
}

/// 依 index 排序並載入暫存檔，失敗的片段捨棄
pub fn reassemble_clips(
    mut results: Vec<TaskResult>,
    backend: &dyn MediaBackend,
    fps: u32,
) -> ExtractionResult {
    results.sort_by_key(|r| r.index);

    let mut extraction = ExtractionResult::default();
    for result in results {
        let degraded = match &result.outcome {
            ClipOutcome::Completed(_) => false,
            ClipOutcome::Degraded(_) => true,
            ClipOutcome::Failed(_) => {
                report_dropped(result.index, "擷取失敗");
                extraction.dropped.push(result.index);
                continue;
            }
        };

        match backend.load_clip(result.outcome.path(), fps) {
            Ok(clip) => extraction.clips.push(ExtractedClip {
                index: result.index,
                clip,
                degraded,
            }),
            Err(e) => {
                report_dropped(result.index, &format!("無法載入暫存檔: {e:#}"));
                extraction.dropped.push(result.index);
            }
        }
    }

    extraction
}

fn report_dropped(index: usize, reason: &str) {
    warn!("捨棄片段 {index}: {reason}");
    eprintln!(
        "{}",
        style(format!("  ⚠ 片段 {index} 已捨棄: {reason}")).yellow()
    );
}

/// 擷取所有片段
///
/// 停用平行處理或片段少於 2 個時在目前執行緒依序處理且不使用暫存檔；
/// 否則以固定大小的 rayon 執行緒池處理，每個工作的解碼在各自的 ffmpeg 子行程中進行。
pub fn extract_clips(
    video_path: &Path,
    metadatas: &[ClipMetadata],
    processing: &ProcessingConfig,
    backend: &dyn MediaBackend,
    shutdown_signal: &AtomicBool,
) -> ThumbnailResult<ExtractionResult> {
    extract_clips_in(video_path, metadatas, processing, backend, shutdown_signal, None)
}

/// 同 [`extract_clips`]，平行模式的暫存目錄建立在 `scratch_parent` 下
pub fn extract_clips_in(
    video_path: &Path,
    metadatas: &[ClipMetadata],
    processing: &ProcessingConfig,
    backend: &dyn MediaBackend,
    shutdown_signal: &AtomicBool,
    scratch_parent: Option<&Path>,
) -> ThumbnailResult<ExtractionResult> {
    if !processing.enable_parallel || metadatas.len() < 2 {
        return extract_sequential(video_path, metadatas, processing, backend, shutdown_signal);
    }

    let workers = resolve_worker_count(
        processing.max_workers,
        logical_core_count(),
        metadatas.len(),
    );
    extract_parallel(
        video_path,
        metadatas,
        processing,
        backend,
        shutdown_signal,
        workers,
        scratch_parent,
    )
}

fn extract_sequential(
    video_path: &Path,
    metadatas: &[ClipMetadata],
    processing: &ProcessingConfig,
    backend: &dyn MediaBackend,
    shutdown_signal: &AtomicBool,
) -> ThumbnailResult<ExtractionResult> {
    let fps = processing.processing_fps;
    info!("依序擷取 {} 個片段", metadatas.len());

    let mut ordered: Vec<&ClipMetadata> = metadatas.iter().collect();
    ordered.sort_by_key(|m| m.index);

    let mut extraction = ExtractionResult::default();
    for metadata in ordered {
        if shutdown_signal.load(Ordering::SeqCst) {
            warn!("收到中斷信號，停止擷取片段");
            return Err(ThumbnailError::Cancelled);
        }

        let primary = render_primary(backend, video_path, metadata, fps)
            .and_then(|frames| Clip::new(frames, fps));
        let (clip, degraded) = match primary {
            Ok(clip) => (Some(clip), false),
            Err(primary_err) => {
                warn!(
                    "片段 {} ({}) 擷取失敗，改用降級片段: {primary_err:#}",
                    metadata.index, metadata.start_time
                );
                let fallback = render_fallback(backend, video_path, metadata, fps)
                    .and_then(|frames| Clip::new(frames, fps));
                match fallback {
                    Ok(clip) => (Some(clip), true),
                    Err(fallback_err) => {
                        error!("片段 {} 降級片段也失敗: {fallback_err:#}", metadata.index);
                        (None, false)
                    }
                }
            }
        };

        match clip {
            Some(clip) => extraction.clips.push(ExtractedClip {
                index: metadata.index,
                clip,
                degraded,
            }),
            None => {
                report_dropped(metadata.index, "擷取失敗");
                extraction.dropped.push(metadata.index);
            }
        }
    }

    Ok(extraction)
}

const SCRATCH_PREFIX: &str = "animated_thumbnail_";

fn create_progress_bar(len: usize) -> ProgressBar {
    let progress_bar = ProgressBar::new(len as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        progress_bar.set_style(bar_style.progress_chars("#>-"));
    }
    progress_bar.set_message("擷取片段中...");
    progress_bar
}

fn extract_parallel(
    video_path: &Path,
    metadatas: &[ClipMetadata],
    processing: &ProcessingConfig,
    backend: &dyn MediaBackend,
    shutdown_signal: &AtomicBool,
    workers: usize,
    scratch_parent: Option<&Path>,
) -> ThumbnailResult<ExtractionResult> {
    let fps = processing.processing_fps;
    let mut scratch = match scratch_parent {
        Some(parent) => ScratchDir::create_in(parent, SCRATCH_PREFIX)?,
        None => ScratchDir::create(SCRATCH_PREFIX)?,
    };
    let tasks = create_clip_tasks(video_path, metadatas, fps, scratch.path());
    for task in &tasks {
        scratch.track(task.temp_output_path.clone());
    }

    info!(
        "平行擷取 {} 個片段，使用 {} 個 worker",
        tasks.len(),
        workers
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("clip-worker-{i}"))
        .build()
        .map_err(|e| anyhow!("無法建立執行緒池: {e}"))?;

    let progress_bar = create_progress_bar(tasks.len());

    let results: Vec<TaskResult> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| {
                if shutdown_signal.load(Ordering::SeqCst) {
                    return TaskResult {
                        index: task.metadata.index,
                        outcome: ClipOutcome::Failed(task.temp_output_path.clone()),
                    };
                }

                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    process_clip_task(task, backend)
                }))
                .unwrap_or_else(|_| {
                    error!("片段 {} 的工作發生 panic", task.metadata.index);
                    TaskResult {
                        index: task.metadata.index,
                        outcome: ClipOutcome::Failed(task.temp_output_path.clone()),
                    }
                });

                progress_bar.inc(1);
                result
            })
            .collect()
    });

    if shutdown_signal.load(Ordering::SeqCst) {
        progress_bar.abandon_with_message("已取消");
        warn!("收到中斷信號，已停止擷取片段");
        return Err(ThumbnailError::Cancelled);
    }
    progress_bar.finish_with_message("完成");

    let extraction = reassemble_clips(results, backend, fps);
    let removed = scratch.cleanup();
    debug!("已清理 {removed} 個暫存檔");

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::super::timestamp_sampler::TimeStamp;
    use super::*;
    use crate::tools::{CompleteMetadata, VideoInfo};
    use image::Rgba;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::{Arc, Mutex};

    /// 以起始秒數決定顏色的純色影格
    struct SolidBackend {
        fail_once: Mutex<HashSet<u64>>,
        always_fail: HashSet<u64>,
        panic_on: HashSet<u64>,
        /// 擷取到這個起點時觸發中斷
        cancel_at: Option<(u64, Arc<AtomicBool>)>,
    }

    impl SolidBackend {
        fn new() -> Self {
            Self {
                fail_once: Mutex::new(HashSet::new()),
                always_fail: HashSet::new(),
                panic_on: HashSet::new(),
                cancel_at: None,
            }
        }
    }

    impl MediaBackend for SolidBackend {
        fn probe(&self, _: &Path) -> Result<VideoInfo> {
            Err(anyhow!("unused"))
        }

        fn probe_metadata(&self, _: &Path) -> Result<CompleteMetadata> {
            Err(anyhow!("unused"))
        }

        fn extract_segment(&self, _: &Path, request: &SegmentRequest) -> Result<Vec<RgbaImage>> {
            let start = request.start_seconds;
            if self.panic_on.contains(&start) {
                panic!("decoder crashed");
            }
            if let Some((at, signal)) = &self.cancel_at
                && *at == start
            {
                signal.store(true, Ordering::SeqCst);
            }
            if self.always_fail.contains(&start) || self.fail_once.lock().unwrap().remove(&start) {
                return Err(anyhow!("segment unavailable"));
            }
            let shade = (start % 250) as u8;
            let frame = RgbaImage::from_pixel(40, 24, Rgba([shade, 200, 100, 255]));
            Ok(vec![frame; (request.duration_seconds * request.fps) as usize])
        }
    }

    fn metadatas(starts: &[u64]) -> Vec<ClipMetadata> {
        starts
            .iter()
            .enumerate()
            .map(|(index, &s)| ClipMetadata {
                start_time: TimeStamp::new(s),
                duration: 1,
                height: 24,
                index,
            })
            .collect()
    }

    fn processing(parallel: bool) -> ProcessingConfig {
        ProcessingConfig {
            max_workers: Some(2),
            processing_fps: 4,
            processing_height: 24,
            enable_parallel: parallel,
        }
    }

    #[test]
    fn test_resolve_worker_count() {
        assert_eq!(resolve_worker_count(None, 8, 3), 3);
        assert_eq!(resolve_worker_count(Some(2), 8, 15), 2);
        assert_eq!(resolve_worker_count(None, 16, 15), 15);
        assert_eq!(resolve_worker_count(Some(0), 8, 4), 1);
    }

    #[test]
    fn test_temp_clip_filename_format() {
        let path = temp_clip_filename(Path::new("/tmp/x"), 7);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("clip_007_"));
        assert!(name.ends_with(".gif"));
        assert_eq!(name.len(), "clip_007_".len() + 8 + ".gif".len());
        assert_ne!(path, temp_clip_filename(Path::new("/tmp/x"), 7));
    }

    #[test]
    fn test_create_clip_tasks_are_plain_data() {
        let tasks = create_clip_tasks(Path::new("/v/a.mp4"), &metadatas(&[0, 40]), 10, Path::new("/tmp"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].metadata.index, 1);
        assert_eq!(tasks[1].processing_fps, 10);
        let json = serde_json::to_string(&tasks[0]).unwrap();
        let back: ClipTask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tasks[0]);
    }

    #[test]
    fn test_process_clip_task_falls_back_then_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = SolidBackend::new();
        backend.fail_once.lock().unwrap().insert(40);
        backend.always_fail.insert(80);

        let tasks = create_clip_tasks(Path::new("/v/a.mp4"), &metadatas(&[0, 40, 80]), 4, dir.path());
        let outcomes: Vec<ClipOutcome> = tasks
            .iter()
            .map(|t| process_clip_task(t, &backend).outcome)
            .collect();

        assert!(matches!(outcomes[0], ClipOutcome::Completed(_)));
        assert!(matches!(outcomes[1], ClipOutcome::Degraded(_)));
        assert!(outcomes[2].is_failed());
        assert!(tasks[0].temp_output_path.exists());
        assert!(tasks[1].temp_output_path.exists());
    }

    #[test]
    fn test_reassemble_orders_by_index_and_drops_failures() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SolidBackend::new();
        let tasks = create_clip_tasks(Path::new("/v/a.mp4"), &metadatas(&[0, 40, 80, 120]), 4, dir.path());
        let mut results: Vec<TaskResult> = tasks.iter().map(|t| process_clip_task(t, &backend)).collect();
        results[2].outcome = ClipOutcome::Failed(results[2].outcome.path().to_path_buf());
        results.reverse();

        let extraction = reassemble_clips(results, &backend, 4);
        let indices: Vec<usize> = extraction.clips.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert_eq!(extraction.dropped, vec![2]);
    }

    #[test]
    fn test_extract_sequential_keeps_order_without_temp_files() {
        let backend = SolidBackend::new();
        let shutdown = AtomicBool::new(false);
        let result = extract_clips(
            Path::new("/v/a.mp4"),
            &metadatas(&[0, 40, 80]),
            &processing(false),
            &backend,
            &shutdown,
        )
        .unwrap();

        assert_eq!(result.clips.len(), 3);
        assert_eq!(result.clips[2].clip.frame(0).get_pixel(39, 0).0[0], 80);
    }

    #[test]
    fn test_extract_parallel_survives_panicking_job() {
        let mut backend = SolidBackend::new();
        backend.panic_on.insert(40);
        let shutdown = AtomicBool::new(false);

        let result = extract_clips(
            Path::new("/v/a.mp4"),
            &metadatas(&[0, 40, 80]),
            &processing(true),
            &backend,
            &shutdown,
        )
        .unwrap();

        let indices: Vec<usize> = result.clips.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(result.dropped, vec![1]);
    }

    #[test]
    fn test_extract_returns_cancelled_when_shutdown_requested() {
        let backend = SolidBackend::new();
        let shutdown = AtomicBool::new(true);

        for parallel in [false, true] {
            let result = extract_clips(
                Path::new("/v/a.mp4"),
                &metadatas(&[0, 40]),
                &processing(parallel),
                &backend,
                &shutdown,
            );
            assert!(matches!(result, Err(ThumbnailError::Cancelled)));
        }
    }

    fn scratch_entries(parent: &Path) -> usize {
        fs::read_dir(parent).unwrap().count()
    }

    #[test]
    fn test_parallel_scratch_removed_after_success() {
        let parent = tempfile::tempdir().unwrap();
        let backend = SolidBackend::new();
        let shutdown = AtomicBool::new(false);

        let result = extract_clips_in(
            Path::new("/v/a.mp4"),
            &metadatas(&[0, 40, 80, 120]),
            &processing(true),
            &backend,
            &shutdown,
            Some(parent.path()),
        )
        .unwrap();

        assert_eq!(result.clips.len(), 4);
        assert_eq!(scratch_entries(parent.path()), 0);
    }

    #[test]
    fn test_parallel_scratch_removed_after_failed_job() {
        let parent = tempfile::tempdir().unwrap();
        let mut backend = SolidBackend::new();
        backend.always_fail.insert(40);
        let shutdown = AtomicBool::new(false);

        let result = extract_clips_in(
            Path::new("/v/a.mp4"),
            &metadatas(&[0, 40, 80]),
            &processing(true),
            &backend,
            &shutdown,
            Some(parent.path()),
        )
        .unwrap();

        assert_eq!(result.dropped, vec![1]);
        assert_eq!(scratch_entries(parent.path()), 0);
    }

    #[test]
    fn test_parallel_scratch_removed_after_cancel() {
        let parent = tempfile::tempdir().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut backend = SolidBackend::new();
        backend.cancel_at = Some((40, Arc::clone(&shutdown)));

        let result = extract_clips_in(
            Path::new("/v/a.mp4"),
            &metadatas(&[0, 40, 80, 120]),
            &processing(true),
            &backend,
            &shutdown,
            Some(parent.path()),
        );

        assert!(matches!(result, Err(ThumbnailError::Cancelled)));
        assert_eq!(scratch_entries(parent.path()), 0);
        println!("✓ 平行擷取暫存目錄清理測試通過");
    }
}
