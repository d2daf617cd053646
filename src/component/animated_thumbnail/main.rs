use super::estimate::estimate_processing_time;
use super::layout_advisor::{LayoutSuggestion, potential_clip_counts, suggest_layout};
use super::media_backend::{FfmpegBackend, MediaBackend};
use super::pipeline::{PipelineReport, create_video_thumbnail};
use crate::config::{
    CompressionConfig, Config, DEFAULT_BATCH_SUFFIX, Preset, ProcessingConfig, UserSettings,
    add_recent_path, create_config_from_settings, create_quick_preview_config, output_path_in,
    parse_grid, retarget_output, save_settings,
};
use crate::error::ThumbnailError;
use crate::signal::{is_shutdown_requested, reset_shutdown_signal};
use crate::tools::{
    REQUIRED_TOOLS, VideoFileInfo, format_duration, format_file_size, get_complete_metadata,
    missing_tools, scan_video_files, validate_directory_exists, validate_video_file,
};
use anyhow::{Result, bail};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 批次處理結果
#[derive(Debug, Default)]
pub struct BatchResult {
    pub total_videos: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 批次輸出位置：指定資料夾（可省略）與檔名後綴
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    pub output_dir: Option<PathBuf>,
    pub suffix: String,
}

impl Default for BatchOutput {
    fn default() -> Self {
        Self {
            output_dir: None,
            suffix: DEFAULT_BATCH_SUFFIX.to_string(),
        }
    }
}

impl BatchOutput {
    /// 依使用者設定建立設定，再把輸出改到批次的位置
    #[must_use]
    pub fn config_for(&self, settings: &UserSettings, video_path: &Path) -> Config {
        let output = output_path_in(self.output_dir.as_deref(), video_path, &self.suffix);
        retarget_output(create_config_from_settings(settings, video_path), &output)
    }
}

/// 單次執行的結果分類
enum RunOutcome {
    Finished,
    Cancelled,
    Failed(String),
}

/// 動態縮圖產生器（互動介面）
pub struct AnimatedThumbnailGenerator {
    shutdown_signal: Arc<AtomicBool>,
    backend: FfmpegBackend,
}

impl AnimatedThumbnailGenerator {
    #[must_use]
    pub const fn new(shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            shutdown_signal,
            backend: FfmpegBackend,
        }
    }

    /// 為單一影片產生動態縮圖
    pub fn run_single(&self, settings: &mut UserSettings) -> Result<()> {
        println!("{}", style("=== 產生動態縮圖 ===").cyan().bold());
        let compression_available = self.check_tools()?;

        let video_path = self.prompt_video_path(settings)?;
        let preset = self.prompt_preset(settings.preset)?;

        let preset_settings = UserSettings {
            preset,
            ..settings.clone()
        };
        let mut config = create_config_from_settings(&preset_settings, &video_path);
        if !compression_available {
            config = config.without_compression();
        }

        self.print_config(&config);
        self.remember_path(settings, &video_path);
        if self.confirm_plan(&config)? {
            self.run_pipeline(&config);
        }

        Ok(())
    }

    /// 以預設組合為基礎，逐項調整參數後產生
    pub fn run_custom(&self, settings: &mut UserSettings) -> Result<()> {
        println!("{}", style("=== 自訂參數產生動態縮圖 ===").cyan().bold());
        let compression_available = self.check_tools()?;

        let video_path = self.prompt_video_path(settings)?;
        let preset = self.prompt_preset(settings.preset)?;
        let preset_settings = UserSettings {
            preset,
            ..settings.clone()
        };
        let mut config = create_config_from_settings(&preset_settings, &video_path);
        if !compression_available {
            config = config.without_compression();
        }

        match self.backend.probe(&video_path) {
            Ok(info) => {
                let suggestion = suggest_layout(info.duration_seconds, info.width, info.height);
                print_suggestion(&suggestion);
                let apply = Confirm::new()
                    .with_prompt("套用建議參數？")
                    .default(false)
                    .interact()?;
                if apply {
                    config = apply_suggestion(config, &suggestion);
                }
            }
            Err(e) => warn!("無法取得影片資訊，略過建議參數: {e:#}"),
        }

        let config = self.prompt_custom_parameters(config)?;
        config.validate()?;

        self.print_config(&config);
        self.remember_path(settings, &video_path);
        if self.confirm_plan(&config)? {
            self.run_pipeline(&config);
        }

        Ok(())
    }

    /// 快速預覽：較短片段、較長間隔
    pub fn run_quick_preview(&self, settings: &mut UserSettings) -> Result<()> {
        println!("{}", style("=== 快速預覽 ===").cyan().bold());
        let compression_available = self.check_tools()?;

        let video_path = self.prompt_video_path(settings)?;
        let base = create_quick_preview_config(&video_path);
        let processing = ProcessingConfig {
            max_workers: settings.max_workers,
            enable_parallel: settings.enable_parallel,
            ..base.processing.clone()
        };
        let mut config = base
            .with_processing(processing)
            .with_include_metadata(settings.include_metadata);
        if !compression_available || !settings.compress_output {
            config = config.without_compression();
        }

        self.print_config(&config);
        self.remember_path(settings, &video_path);
        if self.confirm_plan(&config)? {
            self.run_pipeline(&config);
        }

        Ok(())
    }

    /// 處理資料夾內所有影片
    pub fn run_batch(&self, settings: &UserSettings) -> Result<()> {
        println!("{}", style("=== 批次處理資料夾 ===").cyan().bold());
        let compression_available = self.check_tools()?;

        let input: String = Input::new()
            .with_prompt("請輸入影片資料夾路徑")
            .interact_text()?;
        let input_dir = PathBuf::from(input.trim());
        validate_directory_exists(&input_dir)?;

        println!("{}", style("掃描影片檔案中...").dim());
        let videos = scan_video_files(&input_dir)?;
        if videos.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(());
        }

        println!(
            "{}",
            style(format!("找到 {} 個影片檔案", videos.len())).green()
        );
        for (index, video) in videos.iter().enumerate() {
            println!(
                "  {}. {} ({})",
                index + 1,
                video.path.file_name().unwrap_or_default().to_string_lossy(),
                format_file_size(video.size)
            );
        }

        let preset = self.prompt_preset(settings.preset)?;
        let output = self.prompt_batch_output()?;
        let batch_settings = UserSettings {
            preset,
            ..settings.clone()
        };

        println!();
        println!("{}", style("預計輸出:").dim());
        for video in &videos {
            let config = output.config_for(&batch_settings, &video.path);
            println!(
                "  {} → {}",
                video.path.file_name().unwrap_or_default().to_string_lossy(),
                final_output_of(&config).display()
            );
        }

        let confirmed = Confirm::new()
            .with_prompt(format!(
                "以「{preset}」處理全部 {} 個影片？（選否只顯示計畫）",
                videos.len()
            ))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("{}", style("僅顯示計畫，未處理任何影片").yellow());
            return Ok(());
        }

        let result = self.process_videos(&videos, &batch_settings, &output, compression_available);
        self.print_batch_summary(&result);

        Ok(())
    }

    /// 顯示影片資訊與建議參數
    pub fn show_video_info(&self, settings: &mut UserSettings) -> Result<()> {
        println!("{}", style("=== 影片資訊 ===").cyan().bold());

        let video_path = self.prompt_video_path(settings)?;
        let metadata = get_complete_metadata(&video_path)?;
        let video = &metadata.video;

        println!();
        println!("  檔案: {}", style(&metadata.file.filename).bold());
        println!("  大小: {}", metadata.file.size_human());
        println!(
            "  長度: {} ({})",
            format_duration(video.duration_seconds),
            video.duration_formatted()
        );
        println!("  幀率: {:.2} fps", video.fps);
        println!(
            "  解析度: {}x{} ({})",
            video.width, video.height, video.aspect_ratio
        );
        println!("  視訊編碼: {}", video.codec);
        if let Some(audio) = &metadata.audio {
            println!(
                "  音訊: {}, {} Hz, {}",
                audio.codec, audio.sample_rate_hz, audio.channels
            );
        }

        println!();
        println!("{}", style("可擷取的片段數（2 秒片段）:").dim());
        for (interval, count) in potential_clip_counts(video.duration_seconds) {
            println!("  每 {interval} 秒: {count} 個片段");
        }

        print_suggestion(&suggest_layout(video.duration_seconds, video.width, video.height));

        self.remember_path(settings, &video_path);
        Ok(())
    }

    /// ffmpeg / ffprobe 為必要工具；缺少 gifsicle 時回傳 false 並略過壓縮
    fn check_tools(&self) -> Result<bool> {
        let missing = missing_tools(&REQUIRED_TOOLS);
        let required_missing: Vec<&String> = missing
            .iter()
            .filter(|tool| tool.as_str() != "gifsicle")
            .collect();

        if !required_missing.is_empty() {
            let names: Vec<&str> = required_missing.iter().map(|s| s.as_str()).collect();
            bail!("缺少必要工具: {}，請先安裝後再試", names.join(", "));
        }

        if missing.iter().any(|tool| tool == "gifsicle") {
            warn!("找不到 gifsicle，略過壓縮");
            println!(
                "{}",
                style("找不到 gifsicle，將輸出未壓縮的 GIF").yellow()
            );
            return Ok(false);
        }

        Ok(true)
    }

    fn prompt_video_path(&self, settings: &UserSettings) -> Result<PathBuf> {
        let path = if settings.recent_paths.is_empty() {
            self.prompt_new_path()?
        } else {
            let mut items: Vec<String> = settings.recent_paths.clone();
            items.push("輸入其他路徑...".to_string());

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("選擇影片")
                .items(&items)
                .default(0)
                .interact()?;

            if selection < settings.recent_paths.len() {
                PathBuf::from(&settings.recent_paths[selection])
            } else {
                self.prompt_new_path()?
            }
        };

        validate_video_file(&path)?;
        Ok(path)
    }

    fn prompt_new_path(&self) -> Result<PathBuf> {
        let path: String = Input::new()
            .with_prompt("請輸入影片檔案路徑")
            .interact_text()?;
        Ok(PathBuf::from(path.trim().trim_matches('"')))
    }

    fn prompt_preset(&self, current: Preset) -> Result<Preset> {
        let items: Vec<String> = Preset::ALL.iter().map(ToString::to_string).collect();
        let default_index = Preset::ALL
            .iter()
            .position(|&p| p == current)
            .unwrap_or(0);

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("選擇預設組合")
            .items(&items)
            .default(default_index)
            .interact()?;

        Ok(Preset::ALL[selection])
    }

    fn prompt_batch_output(&self) -> Result<BatchOutput> {
        let dir: String = Input::new()
            .with_prompt("輸出資料夾（留空則與影片相同）")
            .allow_empty(true)
            .interact_text()?;
        let suffix: String = Input::new()
            .with_prompt("輸出檔名後綴")
            .default(DEFAULT_BATCH_SUFFIX.to_string())
            .interact_text()?;

        let dir = dir.trim().trim_matches('"');
        Ok(BatchOutput {
            output_dir: (!dir.is_empty()).then(|| PathBuf::from(dir)),
            suffix: suffix.trim().to_string(),
        })
    }

    fn prompt_custom_parameters(&self, config: Config) -> Result<Config> {
        let grid: String = Input::new()
            .with_prompt("網格 (欄x列)")
            .default(format!("{}x{}", config.cols, config.rows))
            .interact_text()?;
        let (cols, rows) = parse_grid(&grid)?;

        let clip_duration: u32 = Input::new()
            .with_prompt("片段長度（秒）")
            .default(config.clip_duration)
            .interact_text()?;
        let interval: u32 = Input::new()
            .with_prompt("取樣間隔（秒）")
            .default(config.interval)
            .interact_text()?;
        let fps: u32 = Input::new()
            .with_prompt("輸出 fps")
            .default(config.fps)
            .interact_text()?;

        let workers: usize = Input::new()
            .with_prompt("worker 數量（0 = 自動）")
            .default(config.processing.max_workers.unwrap_or(0))
            .interact_text()?;
        let processing_fps: u32 = Input::new()
            .with_prompt("處理 fps（越低越快）")
            .default(config.processing.processing_fps)
            .interact_text()?;
        let processing_height: u32 = Input::new()
            .with_prompt("處理高度（px）")
            .default(config.processing.processing_height)
            .interact_text()?;
        let processing = ProcessingConfig {
            max_workers: (workers > 0).then_some(workers),
            processing_fps,
            processing_height,
            ..config.processing.clone()
        };

        let mut config = config
            .with_grid(cols, rows)
            .with_timing(clip_duration, interval, fps)
            .with_processing(processing);

        if config.compression_enabled() {
            let lossy_level: u32 = Input::new()
                .with_prompt("lossy 等級（0-200）")
                .default(config.compression.lossy_level)
                .interact_text()?;
            let max_colors: u32 = Input::new()
                .with_prompt("色彩數（2-256）")
                .default(config.compression.max_colors)
                .interact_text()?;
            let optimization_level: u8 = Input::new()
                .with_prompt("最佳化等級（1-3）")
                .default(config.compression.optimization_level)
                .interact_text()?;
            let compression = CompressionConfig {
                lossy_level,
                max_colors,
                optimization_level,
                ..config.compression.clone()
            };
            config = config.with_compression(compression);
        }

        let output: String = Input::new()
            .with_prompt("輸出路徑")
            .default(config.output_path.display().to_string())
            .interact_text()?;
        let output = PathBuf::from(output.trim().trim_matches('"'));
        if output != config.output_path {
            config = retarget_output(config, &output);
        }

        Ok(config)
    }

    /// 顯示預估時間並詢問是否開始；選否等同只檢視設定
    fn confirm_plan(&self, config: &Config) -> Result<bool> {
        match self.backend.probe(&config.video_path) {
            Ok(info) => {
                let estimate = estimate_processing_time(config, info.duration_seconds);
                println!("{}", style("處理預估:").dim());
                println!("  片段: {} 個", estimate.clip_count);
                println!("  預估時間: {}", format_duration(estimate.seconds));
                if config.processing.enable_parallel {
                    let workers = config
                        .processing
                        .max_workers
                        .map_or_else(|| "自動".to_string(), |n| n.to_string());
                    println!("  平行 worker: {workers}");
                }
                println!();
            }
            Err(e) => warn!("無法估算處理時間: {e:#}"),
        }

        let start = Confirm::new()
            .with_prompt("開始處理？（選否只顯示設定）")
            .default(true)
            .interact()?;
        if !start {
            println!("{}", style("僅顯示設定，未進行處理").yellow());
        }
        Ok(start)
    }

    fn remember_path(&self, settings: &mut UserSettings, video_path: &Path) {
        add_recent_path(settings, &video_path.to_string_lossy());
        if let Err(e) = save_settings(settings) {
            warn!("無法儲存設定: {e:#}");
        }
    }

    fn print_config(&self, config: &Config) {
        println!();
        println!(
            "  網格 {}x{}, 片段 {} 秒, 間隔 {} 秒, {} fps",
            config.cols, config.rows, config.clip_duration, config.interval, config.fps
        );
        println!(
            "  處理 {} px / {} fps, 平行處理: {}",
            config.processing.processing_height,
            config.processing.processing_fps,
            if config.processing.enable_parallel {
                "開啟"
            } else {
                "關閉"
            }
        );
        if config.compression_enabled() {
            println!(
                "  壓縮 lossy {}, {} 色, -O{}",
                config.compression.lossy_level,
                config.compression.max_colors,
                config.compression.optimization_level
            );
        }
        println!("  輸出: {}", style(final_output_of(config).display()).bold());
        if config.compression_enabled() && config.keep_uncompressed {
            println!("  保留未壓縮檔: {}", config.output_path.display());
        }
        println!();
    }

    fn execute(&self, config: &Config) -> RunOutcome {
        match create_video_thumbnail(config, &self.backend, &self.shutdown_signal) {
            Ok(report) => {
                self.print_report(&report);
                RunOutcome::Finished
            }
            Err(ThumbnailError::Cancelled) => {
                reset_shutdown_signal(&self.shutdown_signal);
                RunOutcome::Cancelled
            }
            Err(e @ (ThumbnailError::ToolNotFound { .. } | ThumbnailError::ToolFailed { .. })) => {
                error!("壓縮失敗: {e}");
                RunOutcome::Failed(format!(
                    "{e}（未壓縮的輸出保留在 {}）",
                    config.output_path.display()
                ))
            }
            Err(e) => {
                error!("產生動態縮圖失敗: {e}");
                RunOutcome::Failed(e.to_string())
            }
        }
    }

    fn run_pipeline(&self, config: &Config) {
        match self.execute(config) {
            RunOutcome::Finished => {}
            RunOutcome::Cancelled => println!("{}", style("操作已取消").yellow()),
            RunOutcome::Failed(message) => {
                eprintln!("{} {}", style("錯誤:").red().bold(), message);
            }
        }
    }

    fn process_videos(
        &self,
        videos: &[VideoFileInfo],
        settings: &UserSettings,
        output: &BatchOutput,
        compression_available: bool,
    ) -> BatchResult {
        let mut result = BatchResult {
            total_videos: videos.len(),
            ..BatchResult::default()
        };

        for (index, video) in videos.iter().enumerate() {
            if is_shutdown_requested(&self.shutdown_signal) {
                warn!("收到中斷訊號，停止批次處理");
                reset_shutdown_signal(&self.shutdown_signal);
                break;
            }

            let video_name = video
                .path
                .file_name()
                .map_or_else(|| format!("video_{index}"), |s| s.to_string_lossy().to_string());
            println!(
                "\n{} [{}/{}] {}",
                style("處理中").cyan(),
                index + 1,
                videos.len(),
                style(&video_name).bold()
            );

            let mut config = output.config_for(settings, &video.path);
            if !compression_available {
                config = config.without_compression();
            }

            if final_output_of(&config).exists() {
                println!("  {} 動態縮圖已存在，跳過", style("⤳").dim());
                result.skipped += 1;
                continue;
            }

            match self.execute(&config) {
                RunOutcome::Finished => {
                    println!("  {} 動態縮圖已建立", style("✓").green());
                    result.successful += 1;
                }
                RunOutcome::Cancelled => {
                    println!("  {} 已取消", style("⤳").yellow());
                    break;
                }
                RunOutcome::Failed(message) => {
                    println!("  {} 處理失敗: {}", style("✗").red(), message);
                    result.failed += 1;
                    if !settings.continue_on_error {
                        warn!("已停用錯誤後繼續，停止批次處理");
                        break;
                    }
                }
            }
        }

        info!(
            "批次處理完成: 成功 {}, 失敗 {}, 跳過 {}",
            result.successful, result.failed, result.skipped
        );
        result
    }

    fn print_report(&self, report: &PipelineReport) {
        println!();
        println!("{}", style("=== 完成 ===").cyan().bold());
        println!(
            "  片段: {} 個 (降級 {}, 捨棄 {})",
            style(report.clip_count).green(),
            report.degraded_count,
            report.dropped_count
        );
        println!(
            "  尺寸: {}x{} px",
            report.output_size.0, report.output_size.1
        );
        if let Some(compression) = &report.compression {
            println!(
                "  壓縮: {} → {} (減少 {:.1}%)",
                format_file_size(compression.original_size),
                format_file_size(compression.compressed_size),
                compression.reduction_percent()
            );
        }
        println!("  耗時: {}", format_duration(report.elapsed.as_secs_f64()));
        println!("  輸出: {}", style(report.final_output.display()).bold());
    }

    fn print_batch_summary(&self, result: &BatchResult) {
        println!();
        println!("{}", style("=== 批次處理摘要 ===").cyan().bold());
        println!("  總計: {} 個影片", result.total_videos);
        println!("  成功: {} 個", style(result.successful).green());
        if result.skipped > 0 {
            println!("  跳過: {} 個", style(result.skipped).yellow());
        }
        if result.failed > 0 {
            println!("  失敗: {} 個", style(result.failed).red());
        }
    }
}

/// 壓縮時為壓縮檔，否則為原始輸出
fn final_output_of(config: &Config) -> &Path {
    if config.compression_enabled() {
        &config.compressed_output_path
    } else {
        &config.output_path
    }
}

fn print_suggestion(suggestion: &LayoutSuggestion) {
    println!();
    println!("{}", style("建議參數:").dim());
    println!(
        "  網格 {}x{}, 間隔 {} 秒, 片段 {} 秒",
        suggestion.cols, suggestion.rows, suggestion.interval, suggestion.clip_duration
    );
    println!(
        "  處理高度 {} px, 輸出 {} fps, 處理 {} fps",
        suggestion.processing_height, suggestion.fps, suggestion.processing_fps
    );
}

fn apply_suggestion(config: Config, suggestion: &LayoutSuggestion) -> Config {
    let processing = ProcessingConfig {
        processing_height: suggestion.processing_height,
        processing_fps: suggestion.processing_fps,
        ..config.processing.clone()
    };
    config
        .with_grid(suggestion.cols, suggestion.rows)
        .with_timing(suggestion.clip_duration, suggestion.interval, suggestion.fps)
        .with_processing(processing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_output_defaults_beside_video() {
        let output = BatchOutput::default();
        let config = output.config_for(&UserSettings::default(), Path::new("/videos/a.mp4"));
        assert_eq!(config.output_path, PathBuf::from("/videos/a_thumb.gif"));
        assert_eq!(
            final_output_of(&config),
            Path::new("/videos/a_thumb_compressed.gif")
        );
    }

    #[test]
    fn test_batch_output_directory_and_suffix() {
        let output = BatchOutput {
            output_dir: Some(PathBuf::from("/thumbs")),
            suffix: "_grid".to_string(),
        };
        let settings = UserSettings {
            compress_output: false,
            ..UserSettings::default()
        };
        let config = output.config_for(&settings, Path::new("/videos/b.mkv"));
        assert_eq!(config.output_path, PathBuf::from("/thumbs/b_grid.gif"));
        assert!(!config.compression_enabled());
        assert_eq!(final_output_of(&config), Path::new("/thumbs/b_grid.gif"));
    }

    #[test]
    fn test_apply_suggestion_overrides_layout() {
        let base = create_config_from_settings(&UserSettings::default(), Path::new("/v/a.mp4"));
        let suggestion = suggest_layout(1200.0, 1920, 1080);
        let config = apply_suggestion(base.clone(), &suggestion);

        assert_eq!((config.cols, config.rows), (4, 4));
        assert_eq!((config.clip_duration, config.interval), (3, 60));
        assert_eq!(config.processing.processing_height, 240);
        assert_eq!(config.processing.max_workers, base.processing.max_workers);
        assert_eq!(config.output_path, base.output_path);
        assert!(config.validate().is_ok());
        println!("✓ 套用建議參數測試通過");
    }
}
