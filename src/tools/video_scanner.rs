use crate::tools::path_validator::has_video_extension;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 掃描資料夾內的影片檔（略過空檔案），依路徑排序
pub fn scan_video_files(directory: &Path) -> Result<Vec<VideoFileInfo>> {
    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_video_extension(entry.path()))
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            (size > 0).then(|| VideoFileInfo {
                path: entry.into_path(),
                size,
            })
        })
        .collect();

    video_files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(video_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_video_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("b.mp4"), b"video-b").unwrap();
        fs::write(nested.join("a.MKV"), b"video-a").unwrap();
        fs::write(dir.path().join("empty.mp4"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();

        let files = scan_video_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(files.len(), 2);
        assert!(names.contains(&"b.mp4".to_string()));
        assert!(names.contains(&"a.MKV".to_string()));
        assert!(files.iter().all(|f| f.size > 0));
        assert!(files[0].path < files[1].path);
    }
}
