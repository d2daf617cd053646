mod cpu_info;
mod ffprobe_info;
mod format;
mod path_validator;
mod tool_check;
mod video_scanner;

pub use cpu_info::logical_core_count;
pub use ffprobe_info::{
    AudioMetadata, CompleteMetadata, FileMetadata, VideoInfo, VideoMetadata,
    get_complete_metadata, get_video_info,
};
pub use format::{aspect_ratio, format_duration, format_file_size, format_hms};
pub use path_validator::{
    VIDEO_EXTENSIONS, ensure_directory_exists, has_video_extension, validate_directory_exists,
    validate_video_file,
};
pub use tool_check::{REQUIRED_TOOLS, find_tool, missing_tools};
pub use video_scanner::{VideoFileInfo, scan_video_files};
