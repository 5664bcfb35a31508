//! File confirmation sink.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use selfie_qa_core::{ConfirmationSink, EncodedImage};
use tracing::info;

/// Writes the confirmed still to a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct FileConfirmationSink {
    path: PathBuf,
}

impl FileConfirmationSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfirmationSink for FileConfirmationSink {
    fn accept(&self, image: &EncodedImage) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, &image.bytes)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!(
            "Wrote {}x{} {} still to {}",
            image.width,
            image.height,
            image.format.extension(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use selfie_qa_core::StillFormat;

    use super::*;

    #[test]
    fn test_writes_bytes_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/still.png");
        let sink = FileConfirmationSink::new(&path);
        let image = EncodedImage {
            bytes: vec![1, 2, 3],
            format: StillFormat::Png,
            width: 1,
            height: 1,
        };
        sink.accept(&image).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let sink = FileConfirmationSink::new(blocker.join("still.png"));
        let image = EncodedImage {
            bytes: vec![0],
            format: StillFormat::Png,
            width: 1,
            height: 1,
        };
        assert!(sink.accept(&image).is_err());
    }
}
