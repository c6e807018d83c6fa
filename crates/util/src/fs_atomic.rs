//! Atomic file replacement.
//!
//! New content is written to a sibling temporary file, flushed, and renamed
//! over the destination, so readers observe either the old or the new file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Replace `path` with `bytes`, creating parent directories as needed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent_directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_directory)?;

    let temp_path = build_temp_path(parent_directory, path);
    let write_result = (|| {
        let mut temp_file = File::create(&temp_path)?;
        temp_file.write_all(bytes)?;
        temp_file.sync_all()
    })();
    if let Err(error) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(error);
    }

    fs::rename(&temp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })
}

fn build_temp_path(parent_directory: &Path, target: &Path) -> PathBuf {
    let process_identifier = std::process::id();
    let timestamp_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();
    let stem = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "runny".to_string());
    parent_directory.join(format!(".{stem}-{process_identifier}-{timestamp_nanos}.tmp"))
}
