use thiserror::Error;

/// Shown when upload is requested without a captured frame
pub const IMAGE_REQUIRED: &str = "Capture an image first";
/// Shown when upload is requested with a blank name
pub const NAME_REQUIRED: &str = "Name field cannot be empty";
/// Shown after any failed upload
pub const UPLOAD_FAILED: &str = "Image failed to upload";
/// Shown after a successful upload
pub const UPLOAD_SUCCEEDED: &str = "Image Uploaded Successfully";

/// Errors raised by the capture client
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        event: &'static str,
        state: &'static str,
    },

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Upload failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for CaptureError {
    fn from(e: reqwest::Error) -> Self {
        CaptureError::Transport(e.to_string())
    }
}
