use super::timestamp_sampler::sample_timestamps;

/// 影片資訊畫面中列出的取樣間隔（秒）
pub const PREVIEW_INTERVALS: [u32; 3] = [30, 60, 120];
/// 估算可擷取片段數時使用的片段長度（秒）
pub const PREVIEW_CLIP_DURATION: u32 = 2;

/// 依影片長度與解析度建議的參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSuggestion {
    pub cols: u32,
    pub rows: u32,
    pub interval: u32,
    pub clip_duration: u32,
    pub processing_height: u32,
    pub fps: u32,
    pub processing_fps: u32,
}

#[must_use]
pub fn suggest_layout(duration_seconds: f64, width: u32, height: u32) -> LayoutSuggestion {
    let (cols, rows, interval, clip_duration) = if duration_seconds < 60.0 {
        (2, 2, 15, 2)
    } else if duration_seconds < 300.0 {
        (3, 3, 30, 2)
    } else if duration_seconds < 1800.0 {
        (4, 4, 60, 3)
    } else {
        (5, 5, 120, 3)
    };

    let processing_height = match height {
        h if h >= 1080 => 240,
        h if h >= 720 => 180,
        h if h >= 480 => 120,
        h => (h / 4).max(80),
    };

    let pixels = u64::from(width) * u64::from(height);
    let (fps, processing_fps) = if pixels > 1920 * 1080 {
        (20, 8)
    } else if pixels > 1280 * 720 {
        (25, 10)
    } else {
        (30, 12)
    };

    LayoutSuggestion {
        cols,
        rows,
        interval,
        clip_duration,
        processing_height,
        fps,
        processing_fps,
    }
}

/// 各取樣間隔下可擷取的片段數（不限網格大小）
#[must_use]
pub fn potential_clip_counts(duration_seconds: f64) -> Vec<(u32, usize)> {
    PREVIEW_INTERVALS
        .iter()
        .map(|&interval| {
            let count =
                sample_timestamps(duration_seconds, PREVIEW_CLIP_DURATION, interval, usize::MAX)
                    .len();
            (interval, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_layout_by_duration() {
        assert_eq!(suggest_layout(45.0, 640, 360).cols, 2);
        let medium = suggest_layout(130.0, 1280, 720);
        assert_eq!((medium.cols, medium.rows, medium.interval), (3, 3, 30));
        let long = suggest_layout(1200.0, 1920, 1080);
        assert_eq!((long.cols, long.interval, long.clip_duration), (4, 60, 3));
        assert_eq!(suggest_layout(7200.0, 1920, 1080).cols, 5);
    }

    #[test]
    fn test_suggest_layout_by_resolution() {
        let uhd = suggest_layout(100.0, 3840, 2160);
        assert_eq!((uhd.processing_height, uhd.fps, uhd.processing_fps), (240, 20, 8));
        let hd = suggest_layout(100.0, 1920, 1080);
        assert_eq!((hd.fps, hd.processing_fps), (25, 10));
        let sd = suggest_layout(100.0, 640, 360);
        assert_eq!((sd.processing_height, sd.fps), (90, 30));
        assert_eq!(suggest_layout(100.0, 160, 120).processing_height, 80);
    }

    #[test]
    fn test_potential_clip_counts() {
        // 130 秒：30 秒間隔 → 0,30,60,90,120 (122 < 130)
        assert_eq!(potential_clip_counts(130.0), vec![(30, 5), (60, 3), (120, 2)]);
        assert_eq!(potential_clip_counts(1.5), vec![(30, 0), (60, 0), (120, 0)]);
    }
}
