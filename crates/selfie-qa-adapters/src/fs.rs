//! Filesystem adapters: image discovery and a looping still-image frame source.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use selfie_qa_core::{DeviceError, Frame, FrameSource};
use tracing::{info, warn};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// A set of image files named by paths or directories.
#[derive(Debug, Clone)]
pub struct ImageFiles {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl ImageFiles {
    /// Creates a file set.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all image files, sorted within each directory.
    #[must_use]
    pub fn collect(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Decodes an image file into an RGB frame.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let image =
        image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?;
    Ok(Frame::from_dynamic(&image))
}

/// Frame source that replays still images in a loop.
///
/// Stands in for a camera: `start` decodes the files, `sample` returns them
/// in order and wraps around, `stop` drops the decoded frames.
#[derive(Debug)]
pub struct StillFrameSource {
    files: Vec<PathBuf>,
    frames: Vec<Frame>,
    cursor: usize,
    started: bool,
}

impl StillFrameSource {
    /// Creates a source replaying `files`.
    #[must_use]
    pub const fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            frames: Vec::new(),
            cursor: 0,
            started: false,
        }
    }

    /// Creates a source from an [`ImageFiles`] set.
    #[must_use]
    pub fn from_files(files: &ImageFiles) -> Self {
        Self::new(files.collect())
    }

    /// Number of image files backing the source.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no image files back the source.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for StillFrameSource {
    fn start(&mut self) -> Result<(), DeviceError> {
        if self.started {
            return Ok(());
        }
        if self.files.is_empty() {
            return Err(DeviceError::Unavailable("no image files to replay".into()));
        }

        let mut frames = Vec::with_capacity(self.files.len());
        for path in &self.files {
            match load_frame(path) {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!("Skipping {}: {e:#}", path.display()),
            }
        }
        if frames.is_empty() {
            return Err(DeviceError::Unavailable(format!(
                "none of {} image files could be decoded",
                self.files.len()
            )));
        }

        info!("Replaying {} still frames", frames.len());
        self.frames = frames;
        self.cursor = 0;
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.frames.clear();
        self.started = false;
    }

    fn sample(&mut self) -> Result<Frame, DeviceError> {
        if !self.started {
            return Err(DeviceError::NotStarted);
        }
        let index = self.cursor % self.frames.len().max(1);
        let frame = self
            .frames
            .get(index)
            .ok_or_else(|| DeviceError::SampleFailed("no decoded frames".into()))?;
        self.cursor = index + 1;
        Ok(frame.clone().restamped())
    }

    fn is_started(&self) -> bool {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(is_supported_image(Path::new("test.webp")));
        assert!(!is_supported_image(Path::new("test.cr2")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_empty_source_is_unavailable() {
        let mut source = StillFrameSource::new(Vec::new());
        assert!(matches!(source.start(), Err(DeviceError::Unavailable(_))));
        assert!(!source.is_started());
    }

    #[test]
    fn test_sample_before_start() {
        let mut source = StillFrameSource::new(vec![PathBuf::from("a.png")]);
        assert_eq!(source.sample().err(), Some(DeviceError::NotStarted));
    }
}
