//! Locally addressable handle to a downloaded video.
//!
//! The bytes live in a temp file that is removed when the last clone of the
//! [`VideoReference`] is dropped. Use [`VideoReference::save_as`] to keep a copy.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Filename offered when the user saves the video.
pub const DEFAULT_VIDEO_FILENAME: &str = "ai_hug_video.mp4";

pub const VIDEO_MIME: &str = "video/mp4";

#[derive(Debug, Clone)]
pub struct VideoReference {
    file: Arc<NamedTempFile>,
    len: u64,
    suggested_filename: String,
}

impl VideoReference {
    /// Write downloaded bytes to a fresh temp file.
    pub fn materialize(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("hug-reel-")
            .suffix(".mp4")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file: Arc::new(file),
            len: bytes.len() as u64,
            suggested_filename: DEFAULT_VIDEO_FILENAME.to_string(),
        })
    }

    /// Override the name offered on save.
    pub fn with_suggested_filename(mut self, name: impl Into<String>) -> Self {
        self.suggested_filename = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mime_type(&self) -> &'static str {
        VIDEO_MIME
    }

    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    /// Copy the video out of its temp file.
    ///
    /// If `dest` is a directory the suggested filename is used inside it.
    /// Returns the path written.
    pub fn save_as(&self, dest: &Path) -> std::io::Result<PathBuf> {
        let target = if dest.is_dir() {
            dest.join(&self.suggested_filename)
        } else {
            dest.to_path_buf()
        };
        std::fs::copy(self.path(), &target)?;
        Ok(target)
    }
}
