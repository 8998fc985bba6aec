use crate::error::CaptureError;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One still frame taken from a camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Encoded image bytes
    pub data: Bytes,
    /// Mime type of `data`
    pub mime: String,
}

impl Frame {
    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime: "image/jpeg".to_string(),
        }
    }
}

/// Something that can hand out a still frame on demand
pub trait FrameSource {
    /// Grab the current frame. Called once per capture.
    fn grab_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Frame source backed by an image file on disk
#[derive(Debug, Clone)]
pub struct StillImageSource {
    path: PathBuf,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn mime_for(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
    }
}

impl FrameSource for StillImageSource {
    fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
        let data = std::fs::read(&self.path).map_err(|e| {
            CaptureError::Camera(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), bytes = data.len(), "Grabbed still frame");

        Ok(Frame {
            data: Bytes::from(data),
            mime: Self::mime_for(&self.path).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_follows_extension() {
        assert_eq!(StillImageSource::mime_for(Path::new("me.PNG")), "image/png");
        assert_eq!(StillImageSource::mime_for(Path::new("me.jpg")), "image/jpeg");
        assert_eq!(StillImageSource::mime_for(Path::new("me")), "image/jpeg");
    }

    #[test]
    fn test_still_image_source_reads_file() {
        let path = std::env::temp_dir().join(format!("selfie-frame-{}.jpg", std::process::id()));
        std::fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();

        let frame = StillImageSource::new(&path).grab_frame().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(frame, Frame::jpeg(vec![0xff, 0xd8, 0xff]));
    }

    #[test]
    fn test_missing_file_is_camera_error() {
        let mut source = StillImageSource::new("/nonexistent/selfie.jpg");
        assert!(matches!(source.grab_frame(), Err(CaptureError::Camera(_))));
    }
}
