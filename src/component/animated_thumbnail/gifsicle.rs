use crate::config::CompressionConfig;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::tools::format_file_size;
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const GIFSICLE: &str = "gifsicle";

/// gifsicle 參數組合，參數順序固定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifsicleCommand {
    input_path: PathBuf,
    output_path: PathBuf,
    optimization_level: u8,
    lossy_level: u32,
    max_colors: u32,
    careful: bool,
}

impl GifsicleCommand {
    #[must_use]
    pub fn new(input_path: &Path, output_path: &Path, config: &CompressionConfig) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            optimization_level: config.optimization_level,
            lossy_level: config.lossy_level,
            max_colors: config.max_colors,
            careful: config.careful_optimization,
        }
    }

    /// `-O<n> --lossy=<n> --colors=<n> [--careful] <input> -o <output>`
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-O{}", self.optimization_level),
            format!("--lossy={}", self.lossy_level),
            format!("--colors={}", self.max_colors),
        ];
        if self.careful {
            args.push("--careful".to_string());
        }
        args.extend([
            self.input_path.to_string_lossy().to_string(),
            "-o".to_string(),
            self.output_path.to_string_lossy().to_string(),
        ]);
        args
    }

    #[must_use]
    pub fn build_command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(self.args());
        cmd
    }
}

/// 壓縮前後的檔案大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionReport {
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

/// 呼叫 gifsicle，同步執行且不重試
#[derive(Debug, Clone)]
pub struct GifsicleCompressor {
    program: String,
}

impl Default for GifsicleCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl GifsicleCompressor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(GIFSICLE)
    }

    #[must_use]
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// 成功時回傳大小報告；無法量測大小時回傳 `None`，不影響結果
    pub fn compress(
        &self,
        input_path: &Path,
        output_path: &Path,
        config: &CompressionConfig,
    ) -> ThumbnailResult<Option<CompressionReport>> {
        let command = GifsicleCommand::new(input_path, output_path, config);
        debug!("執行壓縮: {} {}", self.program, command.args().join(" "));

        let output = command.build_command(&self.program).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ThumbnailError::ToolNotFound {
                    tool: self.program.clone(),
                }
            } else {
                ThumbnailError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ThumbnailError::ToolFailed {
                tool: self.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        let report = match (fs::metadata(input_path), fs::metadata(output_path)) {
            (Ok(original), Ok(compressed)) => Some(CompressionReport {
                original_size: original.len(),
                compressed_size: compressed.len(),
            }),
            (Err(e), _) | (_, Err(e)) => {
                warn!("無法取得壓縮前後的檔案大小: {e}");
                None
            }
        };

        if let Some(report) = &report {
            info!(
                "壓縮完成: {} → {} (減少 {:.1}%)",
                format_file_size(report.original_size),
                format_file_size(report.compressed_size),
                report.reduction_percent()
            );
        }

        Ok(report)
    }
}

/// 以預設的 gifsicle 壓縮
pub fn compress_gif(
    input_path: &Path,
    output_path: &Path,
    config: &CompressionConfig,
) -> ThumbnailResult<Option<CompressionReport>> {
    GifsicleCompressor::new().compress(input_path, output_path, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compression(careful: bool) -> CompressionConfig {
        CompressionConfig {
            lossy_level: 70,
            optimization_level: 3,
            max_colors: 128,
            careful_optimization: careful,
        }
    }

    #[test]
    fn test_args_order_with_careful() {
        let cmd = GifsicleCommand::new(Path::new("in.gif"), Path::new("out.gif"), &compression(true));
        assert_eq!(
            cmd.args(),
            vec!["-O3", "--lossy=70", "--colors=128", "--careful", "in.gif", "-o", "out.gif"]
        );
    }

    #[test]
    fn test_args_without_careful() {
        let cmd = GifsicleCommand::new(Path::new("in.gif"), Path::new("out.gif"), &compression(false));
        let args = cmd.args();
        assert!(!args.contains(&"--careful".to_string()));
        assert_eq!(&args[3..], ["in.gif", "-o", "out.gif"]);
    }

    #[test]
    fn test_reduction_percent() {
        let report = CompressionReport {
            original_size: 1000,
            compressed_size: 250,
        };
        assert!((report.reduction_percent() - 75.0).abs() < f64::EPSILON);
        let empty = CompressionReport {
            original_size: 0,
            compressed_size: 0,
        };
        assert!(empty.reduction_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_program_is_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = GifsicleCompressor::with_program("gifsicle-does-not-exist-4821");
        let err = compressor
            .compress(&dir.path().join("a.gif"), &dir.path().join("b.gif"), &compression(true))
            .unwrap_err();
        match err {
            ThumbnailError::ToolNotFound { tool } => assert_eq!(tool, "gifsicle-does-not-exist-4821"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_tool_failed() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = GifsicleCompressor::with_program("false");
        let err = compressor
            .compress(&dir.path().join("a.gif"), &dir.path().join("b.gif"), &compression(false))
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::ToolFailed { code: Some(1), .. }));
    }
}
