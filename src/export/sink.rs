// Download sink that writes exports into a directory

use super::{DownloadSink, ExportedFile};
use std::fs;
use std::path::{Path, PathBuf};

/// Saves exports into a download directory. The file is written under a
/// `.part` name and renamed once complete, so a failed export never leaves a
/// truncated file behind.
#[derive(Debug, Clone)]
pub struct DirectoryDownloadSink {
    dir: PathBuf,
}

impl DirectoryDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, file: &ExportedFile) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(&file.file_name);
        let partial = self.dir.join(format!("{}.part", file.file_name));

        if let Err(e) = fs::write(&partial, &file.bytes) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        if let Err(e) = fs::rename(&partial, &target) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        Ok(target)
    }
}

impl DownloadSink for DirectoryDownloadSink {
    fn deliver(&self, file: &ExportedFile) -> Result<String, String> {
        // Names come from the pipeline, but never let one escape the directory
        if file.file_name.contains('/') || file.file_name.contains('\\') {
            return Err(format!("Invalid file name: {}", file.file_name));
        }
        self.write(file)
            .map(|path| path.display().to_string())
            .map_err(|e| format!("Failed to save {}: {}", file.file_name, e))
    }
}
