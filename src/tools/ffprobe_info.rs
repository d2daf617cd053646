use crate::tools::format::{aspect_ratio, format_file_size, format_hms};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// 檔案層級資訊
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub filename: String,
    pub size_bytes: u64,
    pub full_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: String,
    pub fps: f64,
    pub duration_seconds: f64,
    pub bitrate_kbps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioMetadata {
    pub codec: String,
    pub sample_rate_hz: u32,
    pub channels: String,
    pub bitrate_kbps: Option<u64>,
}

/// 標頭資訊列使用的完整影片資訊
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteMetadata {
    pub file: FileMetadata,
    pub video: VideoMetadata,
    pub audio: Option<AudioMetadata>,
}

impl FileMetadata {
    #[must_use]
    pub fn size_human(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

impl VideoMetadata {
    #[must_use]
    pub fn duration_formatted(&self) -> String {
        format_hms(self.duration_seconds as u64)
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    profile: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
}

impl FfprobeOutput {
    fn stream_of(&self, codec_type: &str) -> Option<&StreamInfo> {
        self.streams
            .as_ref()?
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(codec_type))
    }

    /// 影片長度（優先從 format，其次從 stream）
    fn duration(&self, stream: &StreamInfo) -> Option<f64> {
        self.format
            .as_ref()
            .and_then(|f| f.duration.as_ref())
            .or(stream.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok())
    }
}

fn run_ffprobe(path: &Path) -> Result<FfprobeOutput> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {stderr}");
    }

    parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
}

fn parse_ffprobe_json(json: &str) -> Result<FfprobeOutput> {
    serde_json::from_str(json).with_context(|| "無法解析 ffprobe 輸出")
}

/// 使用 ffprobe 取得影片資訊
pub fn get_video_info(path: &Path) -> Result<VideoInfo> {
    let probe = run_ffprobe(path)?;
    video_info_from_probe(&probe).with_context(|| format!("影片資訊不完整: {}", path.display()))
}

fn video_info_from_probe(probe: &FfprobeOutput) -> Result<VideoInfo> {
    let video_stream = probe
        .stream_of("video")
        .ok_or_else(|| anyhow::anyhow!("找不到視訊串流"))?;

    let width = video_stream
        .width
        .ok_or_else(|| anyhow::anyhow!("無法取得影片寬度"))?;
    let height = video_stream
        .height
        .ok_or_else(|| anyhow::anyhow!("無法取得影片高度"))?;

    let duration_seconds = probe
        .duration(video_stream)
        .ok_or_else(|| anyhow::anyhow!("無法取得影片長度"))?;

    let frame_rate = video_stream
        .r_frame_rate
        .as_ref()
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration_seconds,
        width,
        height,
        frame_rate,
    })
}

/// 取得標頭資訊列需要的完整資訊
pub fn get_complete_metadata(path: &Path) -> Result<CompleteMetadata> {
    let file = file_metadata(path)?;
    let probe = run_ffprobe(path)?;
    metadata_from_probe(&probe, file)
}

fn file_metadata(path: &Path) -> Result<FileMetadata> {
    if !path.exists() {
        bail!("找不到影片檔案: {}", path.display());
    }
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("無法讀取檔案資訊: {}", path.display()))?
        .len();
    let full_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    Ok(FileMetadata {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        size_bytes,
        full_path: full_path.to_string_lossy().to_string(),
    })
}

fn metadata_from_probe(probe: &FfprobeOutput, file: FileMetadata) -> Result<CompleteMetadata> {
    if probe.streams.as_ref().is_none_or(Vec::is_empty) {
        bail!("檔案中沒有任何媒體串流: {}", file.filename);
    }

    let video = probe.stream_of("video").map_or_else(
        || VideoMetadata {
            codec: "Unknown".to_string(),
            width: 0,
            height: 0,
            aspect_ratio: "Unknown".to_string(),
            fps: 0.0,
            duration_seconds: 0.0,
            bitrate_kbps: None,
        },
        |stream| {
            let width = stream.width.unwrap_or(0);
            let height = stream.height.unwrap_or(0);
            VideoMetadata {
                codec: codec_label(stream),
                width,
                height,
                aspect_ratio: aspect_ratio(width, height),
                fps: stream
                    .r_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .unwrap_or(0.0),
                duration_seconds: probe.duration(stream).unwrap_or(0.0),
                bitrate_kbps: parse_kbps(stream.bit_rate.as_deref()).or_else(|| {
                    parse_kbps(probe.format.as_ref().and_then(|f| f.bit_rate.as_deref()))
                }),
            }
        },
    );

    let audio = probe.stream_of("audio").map(|stream| AudioMetadata {
        codec: codec_label(stream),
        sample_rate_hz: stream
            .sample_rate
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .map_or(0, |hz| hz as u32),
        channels: channel_label(stream.channels, stream.channel_layout.as_deref()),
        bitrate_kbps: parse_kbps(stream.bit_rate.as_deref()),
    });

    Ok(CompleteMetadata { file, video, audio })
}

/// 編碼名稱，附帶 profile（例如 "H264 (High)"）
fn codec_label(stream: &StreamInfo) -> String {
    let codec = stream
        .codec_name
        .as_deref()
        .map_or_else(|| "Unknown".to_string(), str::to_uppercase);
    match stream.profile.as_deref() {
        Some(profile) if codec != "Unknown" && !profile.is_empty() => {
            format!("{codec} ({profile})")
        }
        _ => codec,
    }
}

fn channel_label(channels: Option<u32>, layout: Option<&str>) -> String {
    match channels {
        Some(1) => "mono".to_string(),
        Some(2) => "stereo".to_string(),
        Some(6) => "5.1".to_string(),
        Some(8) => "7.1".to_string(),
        Some(n) => format!("{n} channels"),
        None => layout.map_or_else(|| "unknown".to_string(), str::to_lowercase),
    }
}

/// bps 字串轉為 kbps
fn parse_kbps(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|r| r.parse::<f64>().ok())
        .map(|bps| (bps / 1000.0) as u64)
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    rate.parse().ok()
}
