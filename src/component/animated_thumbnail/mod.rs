//! 動態縮圖元件
//!
//! 流程：
//! A. 取得影片資訊（ffprobe）
//! B. 依間隔取樣片段起點
//! C. 平行擷取片段並加上時間標籤
//! D. 補足並合成網格，可選擇加上資訊列
//! E. 輸出 GIF 並以 gifsicle 壓縮

mod annotation;
mod clip;
mod clip_extractor;
mod estimate;
mod gif_io;
mod gifsicle;
mod grid_layout;
mod layout_advisor;
mod main;
mod media_backend;
mod metadata_header;
mod pipeline;
mod scratch_dir;
mod timestamp_sampler;

pub use annotation::{BitmapFont, annotate_frame, fade_frame, frame_label};
pub use clip::{Clip, ClipMetadata, ClipTask};
pub use clip_extractor::{
    ClipOutcome, ExtractedClip, ExtractionResult, FALLBACK_OPACITY, TaskResult,
    create_clip_tasks, extract_clips, extract_clips_in, process_clip_task, reassemble_clips, resolve_worker_count,
    temp_clip_filename,
};
pub use estimate::{ProcessingEstimate, estimate_processing_time, estimated_clip_count};
pub use gif_io::{read_gif, resample_indices, write_gif};
pub use gifsicle::{CompressionReport, GifsicleCommand, GifsicleCompressor, compress_gif};
pub use grid_layout::{GRID_BACKGROUND, GridGeometry, compose_grid, pad_clips_to_grid_size};
pub use layout_advisor::{LayoutSuggestion, potential_clip_counts, suggest_layout};
pub use main::{AnimatedThumbnailGenerator, BatchOutput, BatchResult};
pub use media_backend::{FfmpegBackend, MediaBackend, SegmentRequest};
pub use metadata_header::{
    MAX_HEADER_HEIGHT, MIN_HEADER_HEIGHT, combine_metadata_with_grid, header_height,
    header_lines, render_header, stack_header,
};
pub use pipeline::{PipelineReport, create_video_thumbnail, create_video_thumbnail_with};
pub use scratch_dir::ScratchDir;
pub use timestamp_sampler::{TimeStamp, create_clip_metadata, sample_timestamps};
