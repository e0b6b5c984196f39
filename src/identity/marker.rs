//! The `.sprite` file pinning a directory to a sandbox name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MARKER_FILE: &str = ".sprite";

pub fn path(dir: &Path) -> PathBuf {
    dir.join(MARKER_FILE)
}

/// Trimmed marker content, or `None` when the file is missing or blank.
pub fn read(dir: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path(dir)) {
        Ok(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn write(dir: &Path, name: &str) -> io::Result<()> {
    fs::write(path(dir), format!("{}\n", name))
}

/// Returns whether a marker was actually removed.
pub fn remove(dir: &Path) -> io::Result<bool> {
    match fs::remove_file(path(dir)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
