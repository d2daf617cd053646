use super::clip::ClipMetadata;
use crate::config::Config;
use crate::tools::format_hms;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 以秒為單位的非負整數時間點
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeStamp {
    pub seconds: u64,
}

impl TimeStamp {
    #[must_use]
    pub const fn new(seconds: u64) -> Self {
        Self { seconds }
    }

    /// HH:MM:SS
    #[must_use]
    pub fn format(self) -> String {
        format_hms(self.seconds)
    }

    #[must_use]
    pub const fn offset_by(self, seconds: u64) -> Self {
        Self::new(self.seconds + seconds)
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// 產生片段起始時間點
///
/// 依序輸出 `0, interval, 2*interval, ...`，只保留 `t + clip_duration < duration`
/// 的時間點，最多 `max_count` 個。影片長度不超過片段長度時回傳空列表。
#[must_use]
pub fn sample_timestamps(
    duration: f64,
    clip_duration: u32,
    interval: u32,
    max_count: usize,
) -> Vec<TimeStamp> {
    if interval == 0 || max_count == 0 {
        return Vec::new();
    }

    let clip_duration = u64::from(clip_duration);
    let interval = u64::from(interval);

    (0u64..)
        .map(|i| i * interval)
        .take_while(|&t| ((t + clip_duration) as f64) < duration)
        .take(max_count)
        .map(TimeStamp::new)
        .collect()
}

/// 依取樣順序為每個時間點建立片段資訊，`index` 即重組順序
#[must_use]
pub fn create_clip_metadata(timestamps: &[TimeStamp], config: &Config) -> Vec<ClipMetadata> {
    timestamps
        .iter()
        .enumerate()
        .map(|(index, &start_time)| ClipMetadata {
            start_time,
            duration: config.clip_duration,
            height: config.processing.processing_height,
            index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_config;
    use std::path::Path;

    fn seconds(timestamps: &[TimeStamp]) -> Vec<u64> {
        timestamps.iter().map(|t| t.seconds).collect()
    }

    #[test]
    fn test_sample_capped_by_max_count() {
        let timestamps = sample_timestamps(130.0, 2, 40, 3);
        assert_eq!(seconds(&timestamps), vec![0, 40, 80]);
    }

    #[test]
    fn test_sample_limited_by_duration() {
        let timestamps = sample_timestamps(130.0, 2, 40, 15);
        assert_eq!(seconds(&timestamps), vec![0, 40, 80, 120]);

        // 120 + 10 == 130，不小於影片長度
        let timestamps = sample_timestamps(130.0, 10, 40, 15);
        assert_eq!(seconds(&timestamps), vec![0, 40, 80]);
    }

    #[test]
    fn test_sample_short_video_is_empty() {
        assert!(sample_timestamps(2.0, 2, 40, 15).is_empty());
        assert!(sample_timestamps(1.5, 2, 40, 15).is_empty());
        assert!(sample_timestamps(0.0, 2, 40, 15).is_empty());
    }

    #[test]
    fn test_sample_degenerate_inputs() {
        assert!(sample_timestamps(100.0, 2, 0, 15).is_empty());
        assert!(sample_timestamps(100.0, 2, 10, 0).is_empty());
        assert!(sample_timestamps(f64::NAN, 2, 10, 5).is_empty());
    }

    #[test]
    fn test_sample_properties_over_grid_of_inputs() {
        for duration in [0.0, 1.0, 2.5, 59.9, 60.0, 130.0, 3600.0] {
            for clip in 1..5 {
                for interval in [1, 3, 7, 40] {
                    for max_count in [0, 1, 4, 15] {
                        let first = sample_timestamps(duration, clip, interval, max_count);
                        assert!(first.len() <= max_count);
                        assert!(first.windows(2).all(|w| w[0] < w[1]));
                        assert!(
                            first
                                .iter()
                                .all(|t| ((t.seconds + u64::from(clip)) as f64) < duration)
                        );
                        assert_eq!(
                            first,
                            sample_timestamps(duration, clip, interval, max_count)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(TimeStamp::new(0).format(), "00:00:00");
        assert_eq!(TimeStamp::new(3725).to_string(), "01:02:05");
        assert_eq!(TimeStamp::new(40).offset_by(1).seconds, 41);
    }

    #[test]
    fn test_create_clip_metadata_indices() {
        let config = create_default_config(Path::new("/v/a.mp4"));
        let timestamps = sample_timestamps(130.0, 2, 40, 3);
        let metadata = create_clip_metadata(&timestamps, &config);

        assert_eq!(metadata.len(), 3);
        for (i, entry) in metadata.iter().enumerate() {
            assert_eq!(entry.index, i);
            assert_eq!(entry.duration, 2);
            assert_eq!(entry.height, 180);
        }
        assert_eq!(metadata[2].start_time, TimeStamp::new(80));
    }
}
