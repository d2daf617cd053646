//! 處理時間的粗略估算，只用於執行前的提示

use crate::config::Config;

/// 每個片段的基準處理秒數
const BASE_SECONDS_PER_CLIP: f64 = 2.0;
/// 未指定 worker 數量時估算使用的數量
const ASSUMED_WORKERS: usize = 4;
const COMPRESSION_FACTOR: f64 = 1.2;
/// 顯示的最短預估時間（秒）
const MIN_ESTIMATE_SECONDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingEstimate {
    pub clip_count: usize,
    pub seconds: f64,
}

/// 預計擷取的片段數：網格格數與 `duration / interval` 取小，至少 1
#[must_use]
pub fn estimated_clip_count(config: &Config, duration_seconds: f64) -> usize {
    let by_interval = (duration_seconds.max(0.0) / f64::from(config.interval.max(1))).floor() as usize;
    config.grid_size().min(by_interval.max(1))
}

#[must_use]
pub fn estimate_processing_time(config: &Config, duration_seconds: f64) -> ProcessingEstimate {
    let clip_count = estimated_clip_count(config, duration_seconds);
    let processing = &config.processing;

    let mut factor = 1.0;
    if processing.processing_fps <= 5 {
        factor *= 0.7;
    } else if processing.processing_fps >= 15 {
        factor *= 1.5;
    }

    if processing.processing_height <= 120 {
        factor *= 0.8;
    } else if processing.processing_height >= 240 {
        factor *= 1.3;
    }

    if processing.enable_parallel {
        let workers = processing.max_workers.unwrap_or(ASSUMED_WORKERS);
        factor /= workers.min(clip_count).max(1) as f64;
    }

    if config.compression_enabled() {
        factor *= COMPRESSION_FACTOR;
    }

    let seconds = clip_count as f64 * BASE_SECONDS_PER_CLIP * factor;
    ProcessingEstimate {
        clip_count,
        seconds: seconds.max(MIN_ESTIMATE_SECONDS),
    }
}
