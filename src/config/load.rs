use crate::config::types::UserSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE: &str = "settings.json";

/// 讀取目前工作目錄下的 settings.json，不存在時回傳預設值
pub fn load_settings() -> Result<UserSettings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> Result<UserSettings> {
    if !path.exists() {
        return Ok(UserSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Preset;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, UserSettings::default());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_settings_from(&path).is_err());
    }

    #[test]
    fn test_reads_saved_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"preset":"fast","max_workers":3}"#).unwrap();
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.preset, Preset::Fast);
        assert_eq!(settings.max_workers, Some(3));
    }
}
