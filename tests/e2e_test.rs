//! E2E Integration Tests
//!
//! 使用真實的 ffmpeg / ffprobe / gifsicle，找不到工具時跳過

use std::path::Path;
use std::process::Command;
use std::sync::atomic::AtomicBool;

use animated_thumbnail::component::animated_thumbnail::{
    FfmpegBackend, MediaBackend, SegmentRequest, create_video_thumbnail, read_gif,
};
use animated_thumbnail::config::{ProcessingConfig, compressed_output_path, create_default_config};
use animated_thumbnail::tools::missing_tools;

/// 以 testsrc 產生指定長度的測試影片
fn generate_test_video(path: &Path, seconds: u32) -> bool {
    let status = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={seconds}:size=160x90:rate=10"),
            "-c:v",
            "mpeg4",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(path)
        .status();

    matches!(status, Ok(s) if s.success()) && path.exists()
}

fn tools_available(tools: &[&str]) -> bool {
    let missing = missing_tools(tools);
    if !missing.is_empty() {
        println!("跳過測試：找不到 {}", missing.join(", "));
        return false;
    }
    true
}

/// 測試 ffmpeg 後端的探測與片段擷取
#[test]
fn test_ffmpeg_backend_extract_segment_e2e() {
    if !tools_available(&["ffmpeg", "ffprobe"]) {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("testsrc.mp4");
    assert!(generate_test_video(&video, 12), "無法產生測試影片");

    let backend = FfmpegBackend;
    let info = backend.probe(&video).unwrap();
    assert!((info.duration_seconds - 12.0).abs() < 0.5);
    assert_eq!((info.width, info.height), (160, 90));

    let frames = backend
        .extract_segment(
            &video,
            &SegmentRequest {
                start_seconds: 4,
                duration_seconds: 2,
                height: 45,
                fps: 5,
            },
        )
        .unwrap();

    assert!((9..=11).contains(&frames.len()), "影格數: {}", frames.len());
    assert_eq!(frames[0].dimensions(), (80, 45));

    println!("✓ ffmpeg 後端測試通過");
}

/// 測試完整流程：130 秒影片 → 3 個片段 → 3x1 網格
#[test]
fn test_animated_thumbnail_pipeline_e2e() {
    if !tools_available(&["ffmpeg", "ffprobe"]) {
        return;
    }
    let compress = missing_tools(&["gifsicle"]).is_empty();

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("testsrc.mp4");
    assert!(generate_test_video(&video, 130), "無法產生測試影片");

    let output = dir.path().join("testsrc.gif");
    let compressed = compressed_output_path(&output);
    let mut config = create_default_config(&video)
        .with_grid(3, 1)
        .with_timing(2, 40, 10)
        .with_processing(ProcessingConfig {
            max_workers: Some(3),
            processing_fps: 5,
            processing_height: 48,
            enable_parallel: true,
        })
        .with_include_metadata(true)
        .with_output_paths(&output, &compressed);
    if !compress {
        config = config.without_compression();
    }

    let shutdown = AtomicBool::new(false);
    let report = create_video_thumbnail(&config, &FfmpegBackend, &shutdown).unwrap();

    println!("完成: {report:?}");
    assert_eq!(report.clip_count, 3);
    assert_eq!(report.dropped_count, 0);
    assert!(report.final_output.exists());

    if compress {
        assert_eq!(report.final_output, compressed);
        assert!(!output.exists(), "壓縮成功後應刪除未壓縮的輸出");
        assert!(report.compression.is_some());
    }

    let gif = read_gif(&report.final_output, 10).unwrap();
    // 3 格寬 85 px（160x90 縮放到 48 px 高）加上 2 個 4 px 間距
    assert_eq!(gif.width(), 3 * 85 + 2 * 4);
    assert!(gif.height() > 48, "應包含資訊列");

    println!("✓ 動態縮圖 E2E 測試通過");
}
