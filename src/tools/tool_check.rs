use std::path::PathBuf;

/// 執行流程需要的外部工具
pub const REQUIRED_TOOLS: [&str; 3] = ["ffmpeg", "ffprobe", "gifsicle"];

/// 是否能在 PATH 中找到指定工具
#[must_use]
pub fn find_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// 回傳 PATH 中缺少的工具名稱
#[must_use]
pub fn missing_tools(tools: &[&str]) -> Vec<String> {
    tools
        .iter()
        .filter(|tool| find_tool(tool).is_none())
        .map(|tool| (*tool).to_string())
        .collect()
}
