use crate::config::types::{CompressionConfig, Config, Preset, ProcessingConfig, UserSettings};
use std::path::{Path, PathBuf};

/// 批次處理輸出檔名的預設後綴
pub const DEFAULT_BATCH_SUFFIX: &str = "_thumb";

#[must_use]
pub const fn create_default_processing_config() -> ProcessingConfig {
    ProcessingConfig {
        max_workers: None,
        processing_fps: 10,
        processing_height: 180,
        enable_parallel: true,
    }
}

#[must_use]
pub const fn create_default_compression_config() -> CompressionConfig {
    CompressionConfig {
        lossy_level: 70,
        optimization_level: 3,
        max_colors: 128,
        careful_optimization: true,
    }
}

/// 標準設定：3x5 網格、每 40 秒取 2 秒片段
#[must_use]
pub fn create_default_config(video_path: &Path) -> Config {
    let output_path = default_output_path(video_path, "");
    Config {
        video_path: video_path.to_path_buf(),
        clip_duration: 2,
        interval: 40,
        fps: 25,
        cols: 3,
        rows: 5,
        grid_padding: 4,
        compressed_output_path: compressed_output_path(&output_path),
        output_path,
        processing: create_default_processing_config(),
        compression: create_default_compression_config(),
        include_metadata: true,
        keep_uncompressed: false,
    }
}

/// 速度優先
#[must_use]
pub fn create_fast_config(video_path: &Path) -> Config {
    let output_path = default_output_path(video_path, Preset::Fast.output_suffix());
    Config {
        fps: 20,
        compressed_output_path: compressed_output_path(&output_path),
        output_path,
        processing: ProcessingConfig {
            processing_height: 120,
            ..create_default_processing_config()
        },
        compression: CompressionConfig {
            lossy_level: 80,
            careful_optimization: false,
            ..create_default_compression_config()
        },
        ..create_default_config(video_path)
    }
}

/// 品質優先
#[must_use]
pub fn create_quality_config(video_path: &Path) -> Config {
    let output_path = default_output_path(video_path, Preset::Quality.output_suffix());
    Config {
        clip_duration: 3,
        interval: 30,
        fps: 30,
        cols: 4,
        rows: 6,
        grid_padding: 5,
        compressed_output_path: compressed_output_path(&output_path),
        output_path,
        processing: ProcessingConfig {
            processing_fps: 15,
            processing_height: 240,
            ..create_default_processing_config()
        },
        compression: CompressionConfig {
            lossy_level: 50,
            max_colors: 256,
            ..create_default_compression_config()
        },
        ..create_default_config(video_path)
    }
}

#[must_use]
pub fn create_preset_config(preset: Preset, video_path: &Path) -> Config {
    match preset {
        Preset::Default => create_default_config(video_path),
        Preset::Fast => create_fast_config(video_path),
        Preset::Quality => create_quality_config(video_path),
    }
}

/// 快速預覽：以 fast 為基礎，再縮短片段並拉長間隔
#[must_use]
pub fn create_quick_preview_config(video_path: &Path) -> Config {
    let output_path = default_output_path(video_path, "_preview");
    let compressed = compressed_output_path(&output_path);
    create_fast_config(video_path)
        .with_output_paths(&output_path, &compressed)
        .with_timing(1, 60, 10)
}

/// 依照使用者設定建立單次執行的設定
#[must_use]
pub fn create_config_from_settings(settings: &UserSettings, video_path: &Path) -> Config {
    let base = create_preset_config(settings.preset, video_path);
    let processing = ProcessingConfig {
        max_workers: settings.max_workers,
        enable_parallel: settings.enable_parallel,
        ..base.processing.clone()
    };
    let config = base
        .with_processing(processing)
        .with_include_metadata(settings.include_metadata)
        .with_keep_uncompressed(settings.keep_uncompressed);

    if settings.compress_output {
        config
    } else {
        config.without_compression()
    }
}

/// `<dir>/<stem><suffix>.gif`，與輸入檔放在同一資料夾
#[must_use]
pub fn default_output_path(video_path: &Path, suffix: &str) -> PathBuf {
    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    video_path.with_file_name(format!("{stem}{suffix}.gif"))
}

/// 指定輸出資料夾時改放到該資料夾，否則與輸入檔同資料夾
#[must_use]
pub fn output_path_in(output_dir: Option<&Path>, video_path: &Path, suffix: &str) -> PathBuf {
    let beside_video = default_output_path(video_path, suffix);
    match (output_dir, beside_video.file_name()) {
        (Some(dir), Some(file_name)) => dir.join(file_name),
        _ => beside_video,
    }
}

/// 以指定的輸出路徑取代設定中的原始與壓縮輸出
#[must_use]
pub fn retarget_output(config: Config, output_path: &Path) -> Config {
    let compression_enabled = config.compression_enabled();
    let compressed = compressed_output_path(output_path);
    let config = config.with_output_paths(output_path, &compressed);
    if compression_enabled {
        config
    } else {
        config.without_compression()
    }
}

#[must_use]
pub fn compressed_output_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_path.with_file_name(format!("{stem}_compressed.gif"))
}
